use anyhow::Context;
use serde::Serialize;
use titan_core::{format_file_size, MediaObject};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so JSON output on stdout stays machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Render one folder listing as a table.
pub fn format_media_table(folder: &str, items: &[MediaObject]) -> String {
    let mut out = String::new();
    let location = if folder.is_empty() { "(bucket root)" } else { folder };
    out.push_str(&format!("\n=== {} ({}) ===\n", location, items.len()));

    if items.is_empty() {
        out.push_str("\nNo files uploaded yet\n");
        return out;
    }

    out.push_str(&format!(
        "\n{:<40} {:<6} {:>10} {:>20}\n",
        "Name", "Type", "Size", "Created At"
    ));
    out.push_str(&format!("{}\n", "-".repeat(79)));

    for item in items {
        let kind = if item.is_video() { "video" } else { "image" };
        out.push_str(&format!(
            "{:<40} {:<6} {:>10} {:>20}\n",
            truncate_string(&item.name, 40),
            kind,
            format_file_size(item.size_bytes),
            item.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_exact() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("ab", 2), "ab");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("vidéo-présentation.mp4", 8), "vidéo...");
    }

    #[test]
    fn media_table_rows() {
        let items = vec![MediaObject {
            name: "reel.mp4".to_string(),
            full_path: "videos/reel.mp4".to_string(),
            public_url: "https://cdn.example.com/media/videos/reel.mp4".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            size_bytes: Some(3 * 1024 * 1024),
            content_type: Some("video/mp4".to_string()),
        }];

        let table = format_media_table("videos", &items);
        assert!(table.contains("=== videos (1) ==="));
        assert!(table.contains("reel.mp4"));
        assert!(table.contains("video"));
        assert!(table.contains("3.0 MB"));
        assert!(table.contains("2024-05-01 12:00:00"));
    }

    #[test]
    fn media_table_empty() {
        let table = format_media_table("", &[]);
        assert!(table.contains("(bucket root)"));
        assert!(table.contains("No files uploaded yet"));
    }
}
