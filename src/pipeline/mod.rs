pub mod stage1_labels;
pub mod stage2_masks;
pub mod stage3_subject;
pub mod stage4_table;
pub mod stage5_report;
