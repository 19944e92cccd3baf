pub mod export;
pub mod formatter;

pub use export::{export_report, write_json, write_scorecards_csv, ExportFormat};
pub use formatter::{
    format_admin_report, format_marks, format_scorecard_detail, format_scorecard_table,
    format_skipped, format_student_result, format_student_tsv, format_tsv, should_use_colors,
};
