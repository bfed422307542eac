use flexi_logger::{DeferredNow, style};
use log::Record;

/// `HH:MM:SS LEVEL target: message`, level colored.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {:<5} {}: {}",
        now.format("%H:%M:%S"),
        style(level).paint(level.to_string()),
        record.module_path().unwrap_or("<unnamed>"),
        record.args()
    )
}
