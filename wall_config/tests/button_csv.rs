use std::fs::File;
use std::io::Write;

use rstest::rstest;
use tempfile::tempdir;
use wall_config::{ButtonLevels, load_button_csv};

fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).expect("create csv");
    f.write_all(body.as_bytes()).expect("write csv");
    path
}

#[rstest]
fn overrides_listed_buttons_and_keeps_the_rest() {
    let dir = tempdir().expect("tempdir");
    let path = write_csv(&dir, "cal.csv", "button,raw\nbutton_2,612\nno_press,3450\n");

    let mut levels = ButtonLevels::default();
    load_button_csv(&path, &mut levels).expect("load csv");

    assert_eq!(levels.button_2, 612);
    assert_eq!(levels.no_press, 3450);
    // Untouched rows keep the factory values.
    assert_eq!(levels.button_4, 1196);
}

#[rstest]
fn rejects_wrong_headers() {
    let dir = tempdir().expect("tempdir");
    let path = write_csv(&dir, "cal.csv", "name,value\nbutton_2,612\n");

    let mut levels = ButtonLevels::default();
    let err = load_button_csv(&path, &mut levels).expect_err("bad headers");
    assert!(format!("{err}").contains("headers 'button,raw'"));
}

#[rstest]
fn rejects_unknown_button_name() {
    let dir = tempdir().expect("tempdir");
    let path = write_csv(&dir, "cal.csv", "button,raw\nbutton_9,100\n");

    let mut levels = ButtonLevels::default();
    let err = load_button_csv(&path, &mut levels).expect_err("unknown button");
    assert!(format!("{err}").contains("unknown button name 'button_9'"));
}

#[rstest]
fn rejects_empty_file() {
    let dir = tempdir().expect("tempdir");
    let path = write_csv(&dir, "cal.csv", "button,raw\n");

    let mut levels = ButtonLevels::default();
    let err = load_button_csv(&path, &mut levels).expect_err("no rows");
    assert!(format!("{err}").contains("contains no rows"));
}

#[rstest]
fn rejects_non_numeric_raw() {
    let dir = tempdir().expect("tempdir");
    let path = write_csv(&dir, "cal.csv", "button,raw\nbutton_2,fast\n");

    let mut levels = ButtonLevels::default();
    let err = load_button_csv(&path, &mut levels).expect_err("bad raw value");
    assert!(format!("{err}").contains("invalid CSV row 2"));
}
