use super::*;

fn mask(bits: &[u8]) -> BinaryMask {
    BinaryMask::new(vec![bits.len()], bits.iter().map(|&b| b != 0).collect()).unwrap()
}

#[test]
fn test_confusion_counts() {
    let pred = mask(&[1, 1, 0, 1, 0]);
    let reference = mask(&[1, 0, 1, 1, 0]);
    let c = Confusion::from_masks(&pred, &reference);
    assert_eq!(
        c,
        Confusion {
            tp: 2,
            fp: 1,
            fn_: 1,
            n_pred: 3,
            n_ref: 3,
        }
    );
}

#[test]
fn test_overlap_scores() {
    let c = Confusion {
        tp: 2,
        fp: 1,
        fn_: 1,
        n_pred: 3,
        n_ref: 3,
    };
    assert!((c.dsc() - 2.0 / 3.0).abs() < 1e-12);
    assert!((c.fbeta(1.0) - c.dsc()).abs() < 1e-12);
    assert!((c.iou() - 0.5).abs() < 1e-12);
    // beta = 2 weights recall: 5*2 / (5*2 + 4*1 + 1)
    assert!((c.fbeta(2.0) - 10.0 / 15.0).abs() < 1e-12);
}

#[test]
fn test_both_empty_overlap_is_one() {
    let c = Confusion::from_masks(&mask(&[0, 0, 0]), &mask(&[0, 0, 0]));
    assert_eq!(c.dsc(), 1.0);
    assert_eq!(c.fbeta(1.0), 1.0);
    assert_eq!(c.iou(), 1.0);
    assert!(c.vol_diff().is_nan());
    assert!(c.rel_vol_diff().is_nan());
}

#[test]
fn test_one_side_empty() {
    let c = Confusion::from_masks(&mask(&[0, 0, 0]), &mask(&[1, 1, 0]));
    assert_eq!(c.dsc(), 0.0);
    assert_eq!(c.vol_diff(), 1.0);
    assert_eq!(c.rel_vol_diff(), -100.0);

    let c = Confusion::from_masks(&mask(&[1, 0, 0]), &mask(&[0, 0, 0]));
    assert_eq!(c.dsc(), 0.0);
    assert_eq!(c.vol_diff(), f64::INFINITY);
}

#[test]
fn test_fbeta_missed_label_is_never_perfect() {
    let missed = Confusion::from_masks(&mask(&[0, 0, 0]), &mask(&[1, 1, 0]));
    assert_eq!(missed.fbeta(0.0), 0.0);
    assert_eq!(missed.fbeta(2.0), 0.0);

    let spurious = Confusion::from_masks(&mask(&[0, 1, 1]), &mask(&[0, 0, 0]));
    assert_eq!(spurious.fbeta(0.0), 0.0);
    assert_eq!(spurious.fbeta(2.0), 0.0);

    let both_empty = Confusion::from_masks(&mask(&[0, 0]), &mask(&[0, 0]));
    assert_eq!(both_empty.fbeta(0.0), 1.0);
}

#[test]
fn test_volume_differences() {
    let c = Confusion {
        tp: 8,
        fp: 1,
        fn_: 2,
        n_pred: 9,
        n_ref: 10,
    };
    assert!((c.vol_diff() - 0.1).abs() < 1e-12);
    assert!((c.rel_vol_diff() + 10.0).abs() < 1e-12);
}
