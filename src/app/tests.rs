use super::*;
use crate::model::{FieldKind, FieldMeta, ModelHandle, ModelMeta, SeedRow, Value};
use crate::services::store::{MemoryStore, Storage, StorageHandle};
use crate::widgets::form::{DialogOptions, DialogPhase};
use chrono::NaiveDate;
use std::rc::Rc;

fn store() -> MemoryStore {
    MemoryStore::new(vec![
        ModelMeta {
            name: "Team".into(),
            display: Some("title".into()),
            fields: vec![FieldMeta::new("title", FieldKind::Char)],
        },
        ModelMeta {
            name: "Person".into(),
            display: Some("name".into()),
            fields: vec![
                FieldMeta::new("name", FieldKind::Char),
                FieldMeta::new("birthdate", FieldKind::Date),
                FieldMeta::new("active", FieldKind::Boolean),
                FieldMeta::new("age", FieldKind::Integer),
                FieldMeta::new("team", FieldKind::ForeignKey).to("Team"),
            ],
        },
    ])
}

fn seed_team(s: &MemoryStore, title: &str) -> ModelHandle {
    let mut row = SeedRow::new();
    row.insert("title".into(), Value::from(title));
    s.insert("Team", row).unwrap()
}

fn blank_person(s: &MemoryStore) -> ModelHandle {
    let p = s.create("Person").unwrap();
    {
        let mut m = p.borrow_mut();
        m.set("name", Value::from("")).unwrap();
        m.set("birthdate", Value::Null).unwrap();
        m.set("active", Value::Bool(false)).unwrap();
    }
    p
}

fn open(s: &MemoryStore, p: &ModelHandle, options: DialogOptions) -> FormDialog {
    let storage: StorageHandle = Rc::new(s.clone());
    FormDialog::new(p.clone(), storage, options).unwrap()
}

fn get(p: &ModelHandle, field: &str) -> Value {
    p.borrow().get(field).unwrap()
}

fn today_iso() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[test]
fn confirm_writes_every_field_and_saves_once() {
    let s = store();
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default().exclude(["age", "team"]));
    let mut host = ScriptedHost::new(vec![
        Step::Type("Ada".into()),
        Step::Key(KeyCode::Tab),
        Step::Key(KeyCode::Tab),
        Step::Key(KeyCode::Char(' ')),
        Step::Key(KeyCode::Enter),
    ])
    .unwrap();

    let phase = dlg.run_modal_and_save(&mut host).unwrap();
    assert_eq!(phase, DialogPhase::Saved);
    assert_eq!(get(&p, "name"), Value::from("Ada"));
    assert_eq!(get(&p, "birthdate"), Value::Text(today_iso()));
    assert_eq!(get(&p, "active"), Value::Bool(true));
    assert_eq!(s.save_count(), 1);
    assert_eq!(s.rows("Person").len(), 1);
    assert_eq!(host.remaining(), 0);
}

#[test]
fn cancel_leaves_instance_untouched() {
    let s = store();
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default().exclude(["age", "team"]));
    let mut host = ScriptedHost::new(vec![
        Step::Type("Ada".into()),
        Step::Key(KeyCode::Tab),
        Step::Key(KeyCode::Tab),
        Step::Key(KeyCode::Char(' ')),
        Step::Key(KeyCode::Esc),
    ])
    .unwrap();

    assert_eq!(
        dlg.run_modal_and_save(&mut host).unwrap(),
        DialogPhase::Cancelled
    );
    assert_eq!(get(&p, "name"), Value::from(""));
    assert_eq!(get(&p, "birthdate"), Value::Null);
    assert_eq!(get(&p, "active"), Value::Bool(false));
    assert_eq!(s.save_count(), 0);
}

#[test]
fn cancel_button_and_exhausted_script_both_cancel() {
    let s = store();
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default().exclude(["team"]));
    // name, birthdate, active, age, OK, Cancel
    let mut host = ScriptedHost::new(Step::parse_script("tab tab tab tab tab enter").unwrap())
        .unwrap();
    assert_eq!(
        dlg.run_modal_and_save(&mut host).unwrap(),
        DialogPhase::Cancelled
    );

    let mut dlg = open(&s, &p, DialogOptions::default());
    let mut host = ScriptedHost::new(vec![Step::Type("x".into())]).unwrap();
    assert_eq!(
        dlg.run_modal_and_save(&mut host).unwrap(),
        DialogPhase::Cancelled
    );
    assert_eq!(s.save_count(), 0);
}

#[test]
fn unedited_confirm_is_idempotent_except_date_and_relation() {
    let s = store();
    let team = seed_team(&s, "Analytical");
    seed_team(&s, "Babbage");
    let p = s.create("Person").unwrap();
    let born = NaiveDate::from_ymd_opt(1815, 12, 10).unwrap();
    {
        let mut m = p.borrow_mut();
        m.set("name", Value::from("Ada")).unwrap();
        m.set("birthdate", Value::Date(born)).unwrap();
        m.set("active", Value::Bool(true)).unwrap();
        m.set("age", Value::from("36")).unwrap();
        m.assign_related("team", Some(team.clone())).unwrap();
    }
    let mut dlg = open(&s, &p, DialogOptions::default());
    let mut host = ScriptedHost::keys(&[KeyCode::Enter]).unwrap();
    dlg.run_modal_and_save(&mut host).unwrap();

    assert_eq!(get(&p, "name"), Value::from("Ada"));
    assert_eq!(get(&p, "active"), Value::Bool(true));
    assert_eq!(get(&p, "age"), Value::from("36"));
    // Dates come back as ISO text
    assert_eq!(get(&p, "birthdate"), Value::from("1815-12-10"));
    let rel = p.borrow().related("team").unwrap().unwrap();
    assert!(Rc::ptr_eq(&rel, &team));
}

#[test]
fn text_fields_are_written_without_coercion() {
    let s = store();
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default());
    assert!(dlg.focus_field("age"));
    let mut host = ScriptedHost::new(Step::parse_script("text:abc enter").unwrap()).unwrap();
    dlg.run_modal_and_save(&mut host).unwrap();
    assert_eq!(get(&p, "age"), Value::from("abc"));
}

#[test]
fn relation_lists_rows_at_open_and_assigns_selected_instance() {
    let s = store();
    seed_team(&s, "Analytical");
    let b = seed_team(&s, "Babbage");
    seed_team(&s, "Difference");
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default());
    {
        let team = dlg.interface().get("team").unwrap();
        let controls = team.adapter.display().controls();
        assert_eq!(controls.len(), 2);
    }
    assert!(dlg.focus_field("team"));
    // Nothing selected yet: first Right selects option 0, second option 1
    let mut host = ScriptedHost::new(Step::parse_script("right right enter").unwrap()).unwrap();
    dlg.run_modal_and_save(&mut host).unwrap();

    let rel = p.borrow().related("team").unwrap().unwrap();
    assert!(Rc::ptr_eq(&rel, &b));
    assert_eq!(get(&p, "team"), Value::Int(b.borrow().pk().unwrap()));
}

#[test]
fn add_runs_nested_dialog_for_new_related_instance() {
    let s = store();
    seed_team(&s, "Analytical");
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default());
    assert!(dlg.focus_field("team"));
    let mut host = ScriptedHost::new(
        Step::parse_script("tab enter text:Difference enter esc").unwrap(),
    )
    .unwrap();

    assert_eq!(
        dlg.run_modal_and_save(&mut host).unwrap(),
        DialogPhase::Cancelled
    );
    assert_eq!(host.shown(), 2);
    assert_eq!(host.max_depth(), 2);
    // Nested dialog saved its own instance; the outer one was cancelled
    assert_eq!(s.save_count(), 1);
    let titles: Vec<String> = s
        .all("Team")
        .unwrap()
        .iter()
        .map(|t| t.borrow().to_string())
        .collect();
    assert_eq!(titles, vec!["Analytical", "Difference"]);
    assert!(p.borrow().related("team").unwrap().is_none());
}

#[test]
fn open_choice_is_not_refreshed_after_add() {
    let s = store();
    seed_team(&s, "Analytical");
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default());
    assert!(dlg.focus_field("team"));
    // Add "Difference", come back, cycle twice: still one option, so the
    // selection wraps back onto "Analytical"
    let mut host = ScriptedHost::new(
        Step::parse_script("tab enter text:Difference enter backtab right right enter").unwrap(),
    )
    .unwrap();
    dlg.run_modal_and_save(&mut host).unwrap();
    let rel = p.borrow().related("team").unwrap().unwrap();
    assert_eq!(rel.borrow().to_string(), "Analytical");
    assert_eq!(s.save_count(), 2);
}

#[test]
fn failed_save_propagates_after_fields_were_written() {
    let s = store();
    s.set_read_only(true);
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default().exclude(["team"]));
    let mut host = ScriptedHost::new(Step::parse_script("text:Ada enter").unwrap()).unwrap();
    let err = dlg.run_modal_and_save(&mut host).unwrap_err();
    assert!(format!("{err:#}").contains("read-only"));
    assert_eq!(dlg.phase(), DialogPhase::Confirmed);
    assert_eq!(get(&p, "name"), Value::from("Ada"));
    assert_eq!(s.save_count(), 0);
}

#[test]
fn dialog_runs_only_once() {
    let s = store();
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default());
    let mut host = ScriptedHost::keys(&[KeyCode::Esc]).unwrap();
    dlg.run_modal_and_save(&mut host).unwrap();
    let err = dlg.run_modal_and_save(&mut host).unwrap_err();
    assert!(err.to_string().contains("already been shown"));
}

#[test]
fn frames_show_title_and_typed_text() {
    let s = store();
    let p = blank_person(&s);
    let mut dlg = open(&s, &p, DialogOptions::default().title("New hire"));
    let mut host = ScriptedHost::new(Step::parse_script("text:Ada").unwrap()).unwrap();
    dlg.run_modal_and_save(&mut host).unwrap();
    let frame = host.last_frame().join("\n");
    assert!(frame.contains("New hire"));
    assert!(frame.contains("Ada"));
    assert!(frame.contains("[ Add ]"));
}

#[test]
fn parse_script_reads_tokens() {
    let steps = Step::parse_script("Tab text:hi ENTER space").unwrap();
    assert_eq!(
        steps,
        vec![
            Step::Key(KeyCode::Tab),
            Step::Type("hi".into()),
            Step::Key(KeyCode::Enter),
            Step::Key(KeyCode::Char(' ')),
        ]
    );
    assert!(Step::parse_script("tab warp").is_err());
}
