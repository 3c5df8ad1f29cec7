use crate::error::Error;
use std::{fs, path::Path};

const BLOCK_DELIMITER: &str = "\n\n\n";

/// Splits a log into request blocks. Two blank lines in a row end a block.
pub fn split_blocks(log: &str) -> Vec<String> {
    log.replace("\r\n", "\n")
        .split(BLOCK_DELIMITER)
        .map(String::from)
        .collect()
}

/// Skips `offset` blocks and keeps the next `count` of them, or all remaining blocks when
/// `count` is `None`.
pub fn select_window<T>(blocks: Vec<T>, offset: usize, count: Option<usize>) -> Vec<T> {
    let remaining = blocks.into_iter().skip(offset);

    match count {
        Some(count) => remaining.take(count).collect(),
        None => remaining.collect(),
    }
}

pub fn load_blocks<P: AsRef<Path>>(
    log_path: P,
    offset: usize,
    count: Option<usize>,
) -> Result<Vec<String>, Error> {
    let log = fs::read_to_string(log_path)?;

    Ok(select_window(split_blocks(&log), offset, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_two_blank_lines() {
        let log = "Started GET \"/1\"\nProcessing\n\n\nStarted GET \"/2\"\n\nProcessing\r\n\r\n\r\nlast";

        assert_eq!(
            split_blocks(log),
            vec![
                "Started GET \"/1\"\nProcessing",
                "Started GET \"/2\"\n\nProcessing",
                "last",
            ]
        );
    }

    #[test]
    fn selects_window() {
        let blocks = vec![0, 1, 2, 3, 4];

        assert_eq!(select_window(blocks.clone(), 1, Some(2)), vec![1, 2]);
        assert_eq!(select_window(blocks.clone(), 3, None), vec![3, 4]);
        assert_eq!(select_window(blocks.clone(), 4, Some(10)), vec![4]);
        assert!(select_window(blocks, 9, Some(1)).is_empty());
    }

    #[test]
    fn missing_log_is_an_error() {
        assert!(matches!(
            load_blocks("/definitely/not/a/log/file.log", 0, None),
            Err(Error::IoError(_))
        ));
    }
}
