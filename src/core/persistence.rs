//! Line-oriented save format: one `mood|title|url` line per editable link.
//!
//! `|` and `\` inside titles are escaped with a backslash. The URL is the raw
//! remainder of the line. `mixed` is never written.
//!
//! Files from before backslashes were escaped load unchanged unless a title
//! holds a literal `\\` or `\|`: those now read back as `\` and `|`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::store::PlaylistStore;
use crate::models::{LinkRecord, Mood};

const SEPARATOR: char = '|';
const ESCAPE: char = '\\';

/// Outcome of a [`load`]: links kept and lines skipped as malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Writes every editable link of `store` to `writer`.
pub fn save<W: Write>(store: &PlaylistStore, mut writer: W) -> std::io::Result<()> {
    for (mood, record) in store.iter() {
        writeln!(
            writer,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            mood.key(),
            escape_title(&record.title),
            record.url
        )?;
    }
    writer.flush()
}

/// Replaces the editable moods of `store` with the links read from `reader`.
///
/// Malformed lines and unknown moods are skipped, not fatal. Bytes that are
/// not valid UTF-8 are replaced rather than rejected. `store` is only touched
/// once the whole stream has been read, so a read error leaves it as it was.
pub fn load<R: BufRead>(store: &mut PlaylistStore, reader: R) -> std::io::Result<LoadReport> {
    let mut loaded = PlaylistStore::new();
    let mut report = LoadReport::default();

    for (line_no, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let line = String::from_utf8_lossy(&bytes);
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        // parse_line only yields editable moods, so add cannot fail
        if let Some((mood, record)) = parse_line(line) {
            if loaded.add(mood, record).is_ok() {
                report.loaded += 1;
                continue;
            }
        }
        log::debug!("skipping line {}: {:?}", line_no + 1, line);
        report.skipped += 1;
    }

    *store = loaded;
    Ok(report)
}

/// Loads `path` into `store`. A missing file means nothing was saved yet.
pub fn load_file(store: &mut PlaylistStore, path: &Path) -> Result<LoadReport> {
    if !path.exists() {
        log::info!("no saved links at {}", path.display());
        store.clear();
        return Ok(LoadReport::default());
    }

    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let report = load(store, BufReader::new(file))
        .with_context(|| format!("cannot read {}", path.display()))?;

    log::info!(
        "loaded {} links from {} ({} lines skipped)",
        report.loaded,
        path.display(),
        report.skipped
    );
    Ok(report)
}

/// Writes `store` to `path`, creating parent directories as needed.
pub fn save_file(store: &PlaylistStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("cannot write {}", path.display()))?;
    save(store, BufWriter::new(file)).with_context(|| format!("cannot write {}", path.display()))?;

    log::debug!("saved {} links to {}", store.len(Mood::Mixed), path.display());
    Ok(())
}

fn escape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Splits `mood|title|url`, honouring escapes in the title field.
/// The mood must be an exact editable key; `mixed` and anything else is rejected.
fn parse_line(line: &str) -> Option<(Mood, LinkRecord)> {
    let (key, rest) = line.split_once(SEPARATOR)?;
    let mood = Mood::EDITABLE.into_iter().find(|m| m.key() == key)?;

    let mut title = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            ESCAPE => match rest[i + 1..].chars().next() {
                Some(next @ (SEPARATOR | ESCAPE)) => {
                    title.push(next);
                    chars.next();
                }
                _ => title.push(c),
            },
            SEPARATOR => {
                let url = &rest[i + 1..];
                return Some((mood, LinkRecord::new(title, url)));
            }
            _ => title.push(c),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn encode(store: &PlaylistStore) -> String {
        let mut buf = Vec::new();
        save(store, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn decode(text: &str) -> (PlaylistStore, LoadReport) {
        let mut store = PlaylistStore::new();
        let report = load(&mut store, Cursor::new(text)).unwrap();
        (store, report)
    }

    #[test]
    fn test_save_format_and_order() {
        let mut store = PlaylistStore::new();
        store
            .add(Mood::Energetic, LinkRecord::new("Run", "https://e"))
            .unwrap();
        store
            .add(Mood::Happy, LinkRecord::new("Sun|Shine", "https://h"))
            .unwrap();
        store
            .add(Mood::Chill, LinkRecord::new("Rain", "https://c"))
            .unwrap();

        assert_eq!(
            encode(&store),
            "happy|Sun\\|Shine|https://h\nchill|Rain|https://c\nenergetic|Run|https://e\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let mut store = PlaylistStore::new();
        store.add(Mood::Happy, LinkRecord::new("a|b", "https://1")).unwrap();
        store.add(Mood::Happy, LinkRecord::new("plain", "https://2")).unwrap();
        store
            .add(Mood::Chill, LinkRecord::new("ends with \\", "https://3"))
            .unwrap();
        store
            .add(Mood::Energetic, LinkRecord::new("\\|mix|\\", "https://4?a=1"))
            .unwrap();

        let (loaded, report) = decode(&encode(&store));
        assert_eq!(loaded, store);
        assert_eq!(report, LoadReport { loaded: 4, skipped: 0 });
        assert_eq!(loaded.get(Mood::Happy)[0].title, "a|b");
    }

    #[test]
    fn test_two_field_line_is_skipped() {
        let text = "happy|only two\nchill|Good|https://c\n";
        let (store, report) = decode(text);
        assert!(store.get(Mood::Happy).is_empty());
        assert_eq!(store.get(Mood::Chill).as_ref(), [LinkRecord::new("Good", "https://c")]);
        assert_eq!(report, LoadReport { loaded: 1, skipped: 1 });
    }

    #[test]
    fn test_invalid_utf8_line_does_not_abort() {
        let mut bytes = b"happy|A|https://a\n".to_vec();
        bytes.extend_from_slice(b"chill|Caf\xe9|https://c\n");
        bytes.extend_from_slice(b"energetic|E|https://e\n");

        let mut store = PlaylistStore::new();
        let report = load(&mut store, Cursor::new(bytes)).unwrap();

        assert_eq!(report, LoadReport { loaded: 3, skipped: 0 });
        assert_eq!(store.get(Mood::Chill)[0].title, "Caf\u{fffd}");
        assert_eq!(store.get(Mood::Energetic).as_ref(), [LinkRecord::new("E", "https://e")]);
    }

    /// Yields `data`, then fails like a disk read error.
    struct BrokenReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(std::io::Error::other("disk went away")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_read_error_keeps_previous_links() {
        let mut store = PlaylistStore::new();
        store.add(Mood::Happy, LinkRecord::new("prior", "https://p")).unwrap();
        let before = store.clone();

        let reader = BrokenReader {
            data: Cursor::new(b"happy|A|https://a\nchill|B|https://b".to_vec()),
        };
        assert!(load(&mut store, BufReader::new(reader)).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn test_mood_key_must_match_exactly() {
        let text = "Happy|T|https://x\n chill|T|https://y\nENERGETIC|T|https://z\nhappy|ok|https://ok\n";
        let (store, report) = decode(text);
        assert_eq!(report, LoadReport { loaded: 1, skipped: 3 });
        assert_eq!(store.get(Mood::Happy).as_ref(), [LinkRecord::new("ok", "https://ok")]);
    }

    #[test]
    fn test_unknown_and_mixed_moods_are_skipped() {
        let text = "sad|T|https://s\nmixed|M|https://m\nenergetic|E|https://e\n";
        let (store, report) = decode(text);
        assert_eq!(store.len(Mood::Mixed), 1);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_url_keeps_remaining_separators() {
        let (store, _) = decode("happy|T|https://x/?q=a|b\n");
        assert_eq!(store.get(Mood::Happy)[0].url, "https://x/?q=a|b");
    }

    #[test]
    fn test_legacy_backslash_kept() {
        let (store, _) = decode("chill|C:\\music|https://c\r\n");
        let link = &store.get(Mood::Chill)[0];
        assert_eq!(link.title, "C:\\music");
        assert_eq!(link.url, "https://c");
    }

    #[test]
    fn test_legacy_double_backslash_collapses() {
        let (store, _) = decode("happy|a\\\\b|https://h\n");
        assert_eq!(store.get(Mood::Happy)[0].title, "a\\b");
    }

    #[test]
    fn test_load_replaces_contents() {
        let mut store = PlaylistStore::new();
        store.add(Mood::Happy, LinkRecord::new("old", "https://old")).unwrap();
        load(&mut store, Cursor::new("chill|new|https://new\n")).unwrap();
        assert!(store.get(Mood::Happy).is_empty());
        assert_eq!(store.len(Mood::Chill), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PlaylistStore::new();
        store.add(Mood::Happy, LinkRecord::new("x", "https://x")).unwrap();
        let report = load_file(&mut store, &dir.path().join("none.txt")).unwrap();
        assert_eq!(report, LoadReport::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_round_trip_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("mood_links.txt");

        let mut store = PlaylistStore::new();
        store.add(Mood::Chill, LinkRecord::new("Lo|Fi", "https://lofi")).unwrap();
        save_file(&store, &path).unwrap();

        let mut loaded = PlaylistStore::new();
        load_file(&mut loaded, &path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_save_to_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlaylistStore::new();
        assert!(save_file(&store, dir.path()).is_err());
    }
}
