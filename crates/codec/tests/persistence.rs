//! On-disk snapshot scenarios: save/load through real files.

use anyhow::Result;
use std::fs;
use table::HashTable;
use tempfile::tempdir;

fn build_table(n: usize) -> Result<HashTable> {
    let mut table = HashTable::new()?;
    for i in 0..n {
        table.insert(format!("key{}", i), format!("value{}", i));
    }
    Ok(table)
}

#[test]
fn save_then_load_from_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("table.snap");

    let table = build_table(25)?;
    codec::save_to_path(&table, &path)?;

    let loaded = codec::load_from_path(&path)?;
    assert_eq!(table, loaded);
    Ok(())
}

#[test]
fn large_table_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("big.snap");

    let table = build_table(1_000)?;
    codec::save_to_path(&table, &path)?;

    let loaded = codec::load_from_path(&path)?;
    assert_eq!(loaded.len(), 1_000);
    assert_eq!(table, loaded);
    Ok(())
}

#[test]
fn save_overwrites_existing_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("table.snap");

    let first = build_table(50)?;
    codec::save_to_path(&first, &path)?;

    let mut second = HashTable::new()?;
    second.insert("only", "entry");
    codec::save_to_path(&second, &path)?;

    let loaded = codec::load_from_path(&path)?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get("only"), Some("entry"));
    Ok(())
}

#[test]
fn load_a_hand_written_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("manual.snap");
    fs::write(&path, "hashline v1\n2\ncity\tBerlin\ncountry\tGermany\n")?;

    let loaded = codec::load_from_path(&path)?;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get("city"), Some("Berlin"));
    assert_eq!(loaded.get("country"), Some("Germany"));
    Ok(())
}

#[test]
fn snapshot_file_is_plain_text() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("table.snap");

    let mut table = HashTable::new()?;
    table.insert("k", "v");
    codec::save_to_path(&table, &path)?;

    let raw = fs::read_to_string(&path)?;
    assert_eq!(raw, "hashline v1\n1\nk\tv\n");
    Ok(())
}

#[test]
fn truncated_file_reports_premature_eof() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("table.snap");

    let table = build_table(10)?;
    codec::save_to_path(&table, &path)?;

    // Chop off the last data line.
    let raw = fs::read_to_string(&path)?;
    let cut = raw.rfind("key").unwrap();
    fs::write(&path, &raw[..cut])?;

    assert_eq!(
        codec::load_from_path(&path).unwrap_err(),
        codec::LoadError::PrematureEof
    );
    Ok(())
}

#[test]
fn mutated_copy_roundtrips_independently() -> Result<()> {
    let dir = tempdir()?;

    let original = build_table(30)?;
    let mut copy = original.try_clone()?;
    copy.insert("key0", "rewritten");
    copy.remove("key1");

    let orig_path = dir.path().join("orig.snap");
    let copy_path = dir.path().join("copy.snap");
    codec::save_to_path(&original, &orig_path)?;
    codec::save_to_path(&copy, &copy_path)?;

    let orig_loaded = codec::load_from_path(&orig_path)?;
    let copy_loaded = codec::load_from_path(&copy_path)?;

    assert_eq!(original, orig_loaded);
    assert_eq!(copy, copy_loaded);
    assert_ne!(orig_loaded, copy_loaded);
    Ok(())
}
