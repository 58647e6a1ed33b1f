//! Local cache files for shifts and people.
//!
//! Two plain-text files, one record per line in the tab-separated format of
//! [`oncall_core::codec`]. They are the fallback when the remote calendar
//! cannot be reached.
//!
//! Writes go to `<path>.tmp` and are renamed over the target, so readers never
//! see a half-written file. There is no locking: two invocations writing at the
//! same time race, and the last rename wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use oncall_core::{CodecError, Person, Shift, codec};
use tracing::{debug, trace, warn};

use crate::error::{CacheError, CacheResult};

/// The two cache files.
#[derive(Debug, Clone)]
pub struct CacheStore {
    shifts_path: PathBuf,
    people_path: PathBuf,
}

impl CacheStore {
    /// Creates a store over the given shift and people files.
    pub fn new(shifts_path: impl Into<PathBuf>, people_path: impl Into<PathBuf>) -> Self {
        Self {
            shifts_path: shifts_path.into(),
            people_path: people_path.into(),
        }
    }

    /// Returns the shift file path.
    pub fn shifts_path(&self) -> &Path {
        &self.shifts_path
    }

    /// Returns the people file path.
    pub fn people_path(&self) -> &Path {
        &self.people_path
    }

    /// Reads every cached shift, in file order.
    pub fn load_shifts(&self) -> CacheResult<Vec<Shift>> {
        load_records(&self.shifts_path, codec::decode_shift)
    }

    /// Reads every cached person, in file order.
    pub fn load_people(&self) -> CacheResult<Vec<Person>> {
        load_records(&self.people_path, codec::decode_person)
    }

    /// Replaces the shift file.
    pub fn save_shifts(&self, shifts: &[Shift]) -> CacheResult<()> {
        save_records(&self.shifts_path, shifts.iter().map(codec::encode_shift))
    }

    /// Replaces the people file. Records are written ordered by query.
    pub fn save_people<'a, I>(&self, people: I) -> CacheResult<()>
    where
        I: IntoIterator<Item = &'a Person>,
    {
        let mut people: Vec<&Person> = people.into_iter().collect();
        people.sort_by(|a, b| a.query.cmp(&b.query));
        save_records(&self.people_path, people.into_iter().map(codec::encode_person))
    }

    /// Returns the age of the older of the two files.
    ///
    /// A file modified in the future counts as age zero.
    pub fn age(&self) -> CacheResult<Duration> {
        let oldest = modified(&self.shifts_path)?.min(modified(&self.people_path)?);
        Ok(SystemTime::now()
            .duration_since(oldest)
            .unwrap_or(Duration::ZERO))
    }
}

fn modified(path: &Path) -> CacheResult<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| read_error(path, source))
}

fn read_error(path: &Path, source: io::Error) -> CacheError {
    if source.kind() == io::ErrorKind::NotFound {
        CacheError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        CacheError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }
}

fn load_records<T>(path: &Path, decode: fn(&str) -> Result<T, CodecError>) -> CacheResult<Vec<T>> {
    let content = fs::read_to_string(path).map_err(|source| read_error(path, source))?;

    let records = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            decode(line).map_err(|source| CacheError::Corrupt {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect::<CacheResult<Vec<T>>>()?;

    debug!(path = %path.display(), records = records.len(), "loaded cache file");
    Ok(records)
}

fn save_records(path: &Path, lines: impl Iterator<Item = String>) -> CacheResult<()> {
    let write_error = |source| CacheError::Write {
        path: path.to_path_buf(),
        source: Arc::new(source),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let mut content = String::new();
    let mut count = 0usize;
    for line in lines {
        content.push_str(&line);
        content.push('\n');
        count += 1;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    if let Err(e) = replace_file(&temp_path, path, content.as_bytes()) {
        if let Err(cleanup) = fs::remove_file(&temp_path)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %temp_path.display(), "failed to remove temporary cache file: {}", cleanup);
        }
        return Err(write_error(e));
    }

    debug!(path = %path.display(), records = count, "saved cache file");
    Ok(())
}

fn replace_file(temp_path: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);
    trace!(path = %temp_path.display(), "wrote temporary cache file");
    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store(dir: &tempfile::TempDir) -> CacheStore {
        CacheStore::new(dir.path().join("calendar.tsv"), dir.path().join("contacts.tsv"))
    }

    fn shift(title: &str, day: u32) -> Shift {
        Shift::new(
            title,
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, day + 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn missing_files_report_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);

        assert!(matches!(store.load_shifts(), Err(CacheError::Missing { .. })));
        assert!(matches!(store.load_people(), Err(CacheError::Missing { .. })));
        assert!(matches!(store.age(), Err(CacheError::Missing { .. })));
    }

    #[test]
    fn shifts_round_trip_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let shifts = vec![shift("Alice", 1), shift("Bob", 2), shift("Alice", 3)];

        store.save_shifts(&shifts).unwrap();
        assert_eq!(store.load_shifts().unwrap(), shifts);
        assert!(!tmp.path().join("calendar.tsv.tmp").exists());
    }

    #[test]
    fn shift_file_format() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save_shifts(&[shift("Alice", 1)]).unwrap();

        let content = fs::read_to_string(store.shifts_path()).unwrap();
        assert_eq!(
            content,
            "2024-01-01T00:00:00+00:00\t2024-01-02T00:00:00+00:00\tAlice\n"
        );
    }

    #[test]
    fn people_written_sorted_by_query() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        let people = [
            Person::new("Carol", None, Some("555-0102".into())),
            Person::new("Alice", Some("alice@example.com".into()), None),
        ];

        store.save_people(&people).unwrap();

        let content = fs::read_to_string(store.people_path()).unwrap();
        assert_eq!(
            content,
            "Alice\talice@example.com\tNone\nCarol\tNone\t555-0102\n"
        );
        let loaded = store.load_people().unwrap();
        assert_eq!(loaded[0].query, "Alice");
        assert_eq!(loaded[1].phone.as_deref(), Some("555-0102"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        fs::write(store.people_path(), "\nAlice\tNone\tNone\n\n").unwrap();

        assert_eq!(store.load_people().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_line_reports_position() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        fs::write(
            store.shifts_path(),
            "2024-01-01T00:00:00Z\t2024-01-02T00:00:00Z\tAlice\nnot a record\n",
        )
        .unwrap();

        match store.load_shifts() {
            Err(CacheError::Corrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(
            tmp.path().join("a").join("calendar.tsv"),
            tmp.path().join("b").join("contacts.tsv"),
        );

        store.save_shifts(&[]).unwrap();
        store.save_people(&[]).unwrap();
        assert!(store.load_shifts().unwrap().is_empty());
        assert!(store.load_people().unwrap().is_empty());
    }

    #[test]
    fn age_of_fresh_files_is_small() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.save_shifts(&[shift("Alice", 1)]).unwrap();
        store.save_people(&[]).unwrap();

        assert!(store.age().unwrap() < Duration::from_secs(60));
    }

    #[test]
    fn unwritable_target_reports_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        // The target path is an existing directory, so the rename fails after
        // the temporary file was written.
        let target = tmp.path().join("calendar.tsv");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();
        let store = CacheStore::new(&target, tmp.path().join("contacts.tsv"));

        assert!(matches!(
            store.save_shifts(&[shift("Alice", 1)]),
            Err(CacheError::Write { .. })
        ));
        assert!(!tmp.path().join("calendar.tsv.tmp").exists());
        assert!(target.join("keep").exists());
    }
}
