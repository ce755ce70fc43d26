use rstest::rstest;
use wall_core::{ButtonId, ButtonMap, MatchMode};

/// The calibration table of the speed-only panel variant.
fn speed_panel() -> ButtonMap {
    ButtonMap::new(
        vec![
            (ButtonId::Button2, 540),
            (ButtonId::Button4, 1196),
            (ButtonId::NoPress, 3507),
        ],
        MatchMode::Tolerance { tolerance: 100 },
    )
}

#[rstest]
#[case(560, ButtonId::Button2)]
#[case(3500, ButtonId::NoPress)]
#[case(2000, ButtonId::NoPress)] // outside every window
#[case(540, ButtonId::Button2)] // exact level
#[case(1290, ButtonId::Button4)] // 94 away, inside
#[case(1296, ButtonId::NoPress)] // 100 away, outside (strict <)
fn tolerance_classification(#[case] sample: i32, #[case] expected: ButtonId) {
    assert_eq!(speed_panel().classify(sample), expected);
}

#[rstest]
#[case(0, ButtonId::Button1)]
#[case(600, ButtonId::Button2)]
#[case(1500, ButtonId::Button4)]
#[case(1700, ButtonId::Button3)]
#[case(2600, ButtonId::Button5)]
#[case(4095, ButtonId::NoPress)]
fn nearest_classification_on_the_full_panel(#[case] sample: i32, #[case] expected: ButtonId) {
    let map = ButtonMap::from(&wall_config::ButtonsCfg {
        mode: wall_config::MatchMode::Nearest,
        ..wall_config::ButtonsCfg::default()
    });
    assert_eq!(map.classify(sample), expected);
}

#[test]
fn nearest_never_returns_no_press_unless_it_is_closest() {
    let map = ButtonMap::from(&wall_config::ButtonsCfg {
        mode: wall_config::MatchMode::Nearest,
        ..wall_config::ButtonsCfg::default()
    });
    // Sweep the ADC range: the result always minimizes distance over the table.
    let levels = [
        (ButtonId::Button1, 5),
        (ButtonId::Button2, 540),
        (ButtonId::Button3, 1807),
        (ButtonId::Button4, 1196),
        (ButtonId::Button5, 2615),
        (ButtonId::NoPress, 3507),
    ];
    for sample in (0..4096).step_by(7) {
        let got = map.classify(sample);
        let got_level = levels.iter().find(|(id, _)| *id == got).map(|&(_, l)| l);
        let best = levels
            .iter()
            .map(|&(_, l)| (sample - l).abs())
            .min()
            .unwrap();
        assert_eq!((sample - got_level.unwrap()).abs(), best, "sample {sample}");
    }
}

#[test]
fn empty_table_classifies_everything_as_no_press() {
    let map = ButtonMap::new(vec![], MatchMode::Nearest);
    assert_eq!(map.classify(123), ButtonId::NoPress);
    let map = ButtonMap::new(vec![], MatchMode::Tolerance { tolerance: 100 });
    assert_eq!(map.classify(123), ButtonId::NoPress);
}
