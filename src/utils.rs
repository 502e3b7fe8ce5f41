use tracing::{info, instrument};

static FALLBACK_NAME: &str = "flipbook";

/// 把书名转换为可用作文件或目录名的字符串
pub fn safe_file_name(title: &str) -> String {
    let name = sanitize_filename::sanitize(title.trim());
    let name = name.trim();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_owned()
    } else {
        name.to_owned()
    }
}

#[instrument]
pub fn display_elapsed_time(duration: std::time::Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        // 超过1分钟：显示分秒
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        info!("✅ 任务完成！耗时: {}分{}秒", mins, secs);
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;
        info!("✅ 任务完成！耗时: {}秒{}毫秒", secs, ms_remaining);
    } else {
        info!("✅ 任务完成！耗时: {}毫秒", total_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_path_separators_from_titles() {
        assert_eq!(safe_file_name("Issue 3/4: Spring"), "Issue 34 Spring");
        assert_eq!(safe_file_name("  Sample Book "), "Sample Book");
    }

    #[test]
    fn falls_back_when_nothing_is_left() {
        assert_eq!(safe_file_name("///"), FALLBACK_NAME);
        assert_eq!(safe_file_name(".."), FALLBACK_NAME);
    }
}
