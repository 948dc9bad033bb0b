use super::*;

fn write_sample(storage: &dyn Storage, path: &Path) {
    let mut writer = ArchiveWriter::create(storage, path).expect("create archive");
    writer
        .write_member(OBJECTS_MEMBER, b"<mission location=\"a\"/>")
        .expect("write objects");
    writer
        .write_member(SCRIPT_MEMBER, b"print('hi')")
        .expect("write script");
    writer.close().expect("close archive");
}

#[test]
fn memory_archive_roundtrip() {
    let storage = MemoryStorage::new();
    let path = Path::new("m.zip");
    write_sample(&storage, path);

    let mut reader = ArchiveReader::open(&storage, path).expect("open archive");
    assert_eq!(
        reader.member_names(),
        vec![OBJECTS_MEMBER.to_string(), SCRIPT_MEMBER.to_string()]
    );
    assert_eq!(
        reader.read_member(SCRIPT_MEMBER).expect("script member"),
        b"print('hi')".to_vec()
    );
}

#[test]
fn missing_member_is_typed() {
    let storage = MemoryStorage::new();
    let path = Path::new("m.zip");
    let mut writer = ArchiveWriter::create(&storage, path).expect("create archive");
    writer
        .write_member(OBJECTS_MEMBER, b"<mission location=\"a\"/>")
        .expect("write objects");
    writer.close().expect("close archive");

    let mut reader = ArchiveReader::open(&storage, path).expect("open archive");
    assert!(reader.try_read_member(SCRIPT_MEMBER).expect("lookup").is_none());
    let err = reader.read_member(SCRIPT_MEMBER).expect_err("member is absent");
    assert!(matches!(err, MissionError::MemberMissing { ref name } if name == SCRIPT_MEMBER));
}

#[test]
fn open_reports_not_found_and_corrupt() {
    let storage = MemoryStorage::new();
    let err = ArchiveReader::open(&storage, Path::new("absent.zip"))
        .err()
        .expect("absent file must fail");
    assert!(err.is_not_found());

    storage.insert("junk.zip", b"definitely not a zip".to_vec());
    let err = ArchiveReader::open(&storage, Path::new("junk.zip"))
        .err()
        .expect("junk must fail");
    assert!(matches!(
        err,
        MissionError::ArchiveOpenFailed {
            reason: ArchiveOpenReason::CorruptArchive,
            ..
        }
    ));
}

#[test]
fn dropped_writer_discards_partial_archive() {
    let storage = MemoryStorage::new();
    let path = Path::new("m.zip");
    write_sample(&storage, path);
    let before = storage.get(path).expect("first archive");

    {
        let mut writer = ArchiveWriter::create(&storage, path).expect("create archive");
        writer
            .write_member(OBJECTS_MEMBER, b"<half")
            .expect("write objects");
    }

    assert_eq!(storage.get(path), Some(before));
}

#[test]
fn fs_storage_replaces_target_on_close() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.zip");
    std::fs::write(&path, b"old contents").expect("seed file");

    write_sample(&FsStorage, &path);

    let mut reader = ArchiveReader::open(&FsStorage, &path).expect("open archive");
    assert_eq!(
        reader.read_member(OBJECTS_MEMBER).expect("objects"),
        b"<mission location=\"a\"/>".to_vec()
    );
    let leftovers = std::fs::read_dir(dir.path()).expect("read dir").count();
    assert_eq!(leftovers, 1, "temporary file must be renamed, not left behind");
}

#[test]
fn fs_storage_keeps_old_file_when_writer_is_dropped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.zip");
    std::fs::write(&path, b"old contents").expect("seed file");

    {
        let mut writer = ArchiveWriter::create(&FsStorage, &path).expect("create archive");
        writer
            .write_member(OBJECTS_MEMBER, b"partial")
            .expect("write objects");
    }

    assert_eq!(std::fs::read(&path).expect("read"), b"old contents".to_vec());
}
