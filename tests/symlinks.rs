// tests/symlinks.rs

#![cfg(unix)]

mod common;

use common::create_file;
use dirbundle::{plan, CancellationToken, ConfigBuilder};
use std::os::unix::fs::symlink;
use tempfile::tempdir;

fn planned_paths(builder: ConfigBuilder) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let files = plan(&builder.build()?, &CancellationToken::new())?;
    Ok(files.into_iter().map(|f| f.relative_path).collect())
}

#[test]
fn test_symlinks_are_skipped_by_default() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "a.txt", "a")?;
    symlink(src.path().join("a.txt"), src.path().join("link.txt"))?;

    let paths = planned_paths(
        ConfigBuilder::new()
            .source(src.path())
            .output_file(src.path().join("out.txt")),
    )?;
    assert_eq!(paths, vec!["a.txt"]);
    Ok(())
}

#[test]
fn test_link_to_ancestor_is_a_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "a.txt", "a")?;
    create_file(src.path(), "sub/b.txt", "b")?;
    symlink(src.path(), src.path().join("sub/back"))?;

    let paths = planned_paths(
        ConfigBuilder::new()
            .source(src.path())
            .output_file(src.path().join("out.txt"))
            .include_symlinks(true),
    )?;
    assert_eq!(paths, vec!["a.txt", "sub/b.txt"]);
    Ok(())
}

#[test]
fn test_mutual_links_terminate() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    create_file(src.path(), "one/x.txt", "x")?;
    create_file(src.path(), "two/y.txt", "y")?;
    symlink(src.path().join("two"), src.path().join("one/to_two"))?;
    symlink(src.path().join("one"), src.path().join("two/to_one"))?;

    let paths = planned_paths(
        ConfigBuilder::new()
            .source(src.path())
            .output_file(src.path().join("out.txt"))
            .include_symlinks(true),
    )?;
    assert!(paths.contains(&"one/x.txt".to_string()));
    assert!(paths.contains(&"two/y.txt".to_string()));
    assert!(paths.len() <= 4, "unexpected expansion: {:?}", paths);
    Ok(())
}

#[test]
fn test_links_outside_the_source_are_followed() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempdir()?;
    let outside = tempdir()?;
    create_file(src.path(), "a.txt", "a")?;
    create_file(outside.path(), "lib/shared.txt", "shared")?;
    symlink(outside.path().join("lib"), src.path().join("vendor"))?;
    symlink(outside.path().join("lib/shared.txt"), src.path().join("shared_link.txt"))?;
    symlink(src.path().join("missing.txt"), src.path().join("broken.txt"))?;

    let paths = planned_paths(
        ConfigBuilder::new()
            .source(src.path())
            .output_file(src.path().join("out.txt"))
            .include_symlinks(true),
    )?;
    assert_eq!(paths, vec!["a.txt", "shared_link.txt", "vendor/shared.txt"]);
    Ok(())
}
