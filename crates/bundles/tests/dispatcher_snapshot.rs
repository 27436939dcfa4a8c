use bundles::app::codegen::{DEFAULT_TEMPLATE, DispatchProgram, Generator};
use bundles::domain::model::{Action, Bundle, Item};
use insta::assert_snapshot;

#[test]
fn dispatcher_renders_cases_in_source_order() {
    let bundles = vec![
        Bundle {
            label: "morning".into(),
            items: vec![
                Item::new(Action::Url, "https://example.com"),
                Item::new(Action::Shell, "echo \"hello\""),
            ],
        },
        Bundle {
            label: "build".into(),
            items: vec![Item::new(Action::Shell, "cargo build --release")],
        },
    ];

    let program = DispatchProgram::lower("workday.bndl", bundles);
    let rendered = Generator::new()
        .expect("generator")
        .render(&program, DEFAULT_TEMPLATE)
        .expect("render dispatcher");
    assert_snapshot!("dispatcher_workday", rendered);
}
