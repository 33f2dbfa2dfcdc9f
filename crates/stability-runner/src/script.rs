//! Query script loading.

use std::fs;
use std::io;
use std::path::Path;

/// Trim the script and collapse it onto a single line.
pub fn collapse_script(raw: &str) -> String {
    raw.trim()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read the script at `path`, collapsed onto a single line.
pub fn load_script(path: impl AsRef<Path>) -> io::Result<String> {
    Ok(collapse_script(&fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_collapse_script() {
        let raw = "\n  select c1, sum(c2) over w\nfrom t1\r\nwindow w as (partition by c1 order by c3 rows between 10 preceding and current row);\n\n";
        assert_eq!(
            collapse_script(raw),
            "select c1, sum(c2) over w from t1 window w as (partition by c1 order by c3 rows between 10 preceding and current row);"
        );
    }

    #[test]
    fn test_load_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "select *\nfrom t1;").unwrap();
        assert_eq!(load_script(file.path()).unwrap(), "select * from t1;");
    }

    #[test]
    fn test_load_missing_script() {
        assert!(load_script("/nonexistent/script.sql").is_err());
    }
}
