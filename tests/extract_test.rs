use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="1.0">
  <body>
    <outline text="Reading">
      <outline text="Kindling">
        <outline text="Caf&amp;eacute; Blog" htmlUrl="http://cafe.com/" />
        <outline text="Old Name" htmlUrl="http://old.com" />
      </outline>
    </outline>
  </body>
</opml>
"#;

fn cmd(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("opml-timeline");
    cmd.current_dir(root)
        .env("OPML_TIMELINE_HOME", root.join("home"))
        .env("OPML_TIMELINE_CONFIG_PATH", root.join("home/config.toml"))
        .env_remove("OPML_TIMELINE_SECTIONS")
        .env_remove("OPML_TIMELINE_URL_MAP");
    cmd
}

#[test]
fn extract_writes_observations_for_a_nested_section() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("subscriptions.opml");
    fs::write(&file, DOC).expect("write");
    let map = tmp.path().join("map.json");
    fs::write(&map, r#"[{"old": "old.com", "new": "https://new.com"}]"#).expect("write map");
    let out = tmp.path().join("items.json");

    cmd(tmp.path())
        .arg("extract")
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .args(["--date", "20241105", "--sections", "Kindling"])
        .arg("--url-map")
        .arg(&map)
        .assert()
        .success()
        .stdout(predicate::str::contains("detail: candidates=2"));

    let raw = fs::read_to_string(&out).expect("read");
    let got: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(
        got,
        serde_json::json!([
            {
                "title": "Café Blog",
                "url": "http://cafe.com/",
                "start": "2024-11-05T00:00:00.000Z",
                "end": "2024-11-05T00:00:00.000Z"
            },
            {
                "title": "Old Name",
                "url": "https://new.com",
                "start": "2024-11-05T00:00:00.000Z",
                "end": "2024-11-05T00:00:00.000Z"
            }
        ])
    );
}

#[test]
fn extract_takes_the_date_from_the_file_name() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("fever-20200119.opml");
    fs::write(&file, DOC).expect("write");
    let out = tmp.path().join("items.json");

    cmd(tmp.path())
        .arg("extract")
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .args(["--sections", "Kindling"])
        .assert()
        .success()
        .stdout(predicate::str::contains("detail: date=2020-01-19"));
}

#[test]
fn extract_reports_a_missing_section() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("subscriptions.opml");
    fs::write(&file, DOC).expect("write");
    let out = tmp.path().join("items.json");

    cmd(tmp.path())
        .arg("extract")
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .args(["--date", "20200101", "--sections", "Nope"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no outline found with the title `Nope`"));

    assert!(!out.exists());
}

#[test]
fn extract_reports_a_non_opml_document() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("feed.xml");
    fs::write(&file, "<rss><channel/></rss>").expect("write");

    cmd(tmp.path())
        .arg("extract")
        .arg(&file)
        .arg("--output")
        .arg(tmp.path().join("items.json"))
        .args(["--date", "20200101", "--sections", "Feeds", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"ok\": false"))
        .stdout(predicate::str::contains("E004_NOT_OPML"));
}

#[test]
fn extract_without_output_prints_json_to_stdout() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("fever-20200119.opml");
    fs::write(&file, DOC).expect("write");

    let assert = cmd(tmp.path())
        .arg("extract")
        .arg(&file)
        .args(["--sections", "Kindling"])
        .assert()
        .success()
        .stderr(predicate::str::contains("detail: written=stdout"));

    let got: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("stdout is json");
    let titles: Vec<&str> = got
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|item| item["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Café Blog", "Old Name"]);
    assert_eq!(got[0]["start"], "2020-01-19T00:00:00.000Z");
    assert!(!tmp.path().join("items.json").exists());
}
