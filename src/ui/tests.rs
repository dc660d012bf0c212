use super::state::{Preferences, TextEditorState};
use super::*;
use crate::config::AppConfig;
use crate::error::ExportError;
use crate::export::ExportReport;
use crate::style::TextStyle;
use crate::types::*;
use eframe::egui;
use std::path::PathBuf;

const BACKGROUND: &str = "/billboard.png";

fn screen() -> egui::Rect {
    egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1200.0, 800.0))
}

/// Run one headless frame of the canvas with the provided input events.
fn run_canvas(ctx: &egui::Context, app: &mut BillboardApp, events: Vec<egui::Event>) {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(screen());
    raw.events = events;
    let _ = ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });
}

/// An app whose background texture is already loaded, with bounds measured by one frame.
fn app_with_background(ctx: &egui::Context) -> BillboardApp {
    let mut app = BillboardApp::new(AppConfig::default(), None);
    let pixels = [128u8; 4 * 4 * 4];
    let image = egui::ColorImage::from_rgba_unmultiplied([4, 4], &pixels);
    app.textures.insert(ctx, BACKGROUND, Size::new(1000.0, 600.0), image);
    run_canvas(ctx, &mut app, Vec::new());
    app
}

fn press(pos: egui::Pos2) -> Vec<egui::Event> {
    vec![
        egui::Event::PointerMoved(pos),
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed: true,
            modifiers: egui::Modifiers::NONE,
        },
    ]
}

fn key(key: egui::Key) -> Vec<egui::Event> {
    vec![egui::Event::Key {
        key,
        physical_key: Some(key),
        pressed: true,
        repeat: false,
        modifiers: egui::Modifiers::NONE,
    }]
}

fn pos(p: Point) -> egui::Pos2 {
    egui::pos2(p.x, p.y)
}

#[test]
fn first_frame_measures_billboard_bounds() {
    let ctx = egui::Context::default();
    let app = app_with_background(&ctx);

    let bounds = app.session.bounds();
    assert!(bounds.width() > 0.0 && bounds.height() > 0.0);
    // The sign face keeps the background's proportions
    let ratio = bounds.width() / bounds.height();
    let expected = (0.63 * 1000.0) / (0.4275 * 600.0);
    assert!((ratio - expected).abs() < 0.01, "ratio {ratio} vs {expected}");
}

#[test]
fn clicking_element_selects_it() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let id = app.session.apply(SessionAction::AddText).expect("text added");
    app.session.apply(SessionAction::Select(None));

    let center = app.session.element(id).expect("element exists").rect().center();
    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(pos(center))]);
    run_canvas(&ctx, &mut app, press(pos(center)));

    assert_eq!(app.session.selected(), Some(id));
    assert!(app.drag.is_some(), "press should start a move");
}

#[test]
fn clicking_empty_canvas_clears_selection() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let id = app.session.apply(SessionAction::AddText).expect("text added");
    assert_eq!(app.session.selected(), Some(id));

    let corner = egui::pos2(20.0, 780.0);
    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(corner)]);
    run_canvas(&ctx, &mut app, press(corner));

    assert_eq!(app.session.selected(), None);
    assert!(app.drag.is_none());
}

#[test]
fn dragging_moves_element_and_stays_in_bounds() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let id = app.session.apply(SessionAction::AddText).expect("text added");
    let start = app.session.element(id).expect("element exists").rect();

    let grab = pos(start.center());
    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(grab)]);
    run_canvas(&ctx, &mut app, press(grab));

    // Button stays down: small move follows the pointer exactly
    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(grab + egui::vec2(40.0, 20.0))]);
    let moved = app.session.element(id).expect("element exists").rect();
    assert!((moved.x - (start.x + 40.0)).abs() < 0.01);
    assert!((moved.y - (start.y + 20.0)).abs() < 0.01);

    // Far past the right edge: clamped flush with it
    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(grab + egui::vec2(2000.0, 0.0))]);
    let bounds = app.session.bounds();
    let clamped = app.session.element(id).expect("element exists").rect();
    assert!((clamped.right() - bounds.right).abs() < 0.01);
    assert!((clamped.y - start.y).abs() < 0.01);
}

#[test]
fn dragging_corner_handle_resizes_keeping_aspect() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let id = app.session.apply(SessionAction::AddText).expect("text added");
    let start = app.session.element(id).expect("element exists").rect();
    let handle = pos(ResizeCorner::BottomRight.point_on(&start));

    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(handle)]);
    run_canvas(&ctx, &mut app, press(handle));
    assert_eq!(
        app.drag.map(|d| d.mode),
        Some(super::state::DragMode::Resize(ResizeCorner::BottomRight))
    );

    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(handle + egui::vec2(60.0, 0.0))]);
    let resized = app.session.element(id).expect("element exists").rect();
    assert!((resized.width - start.width * 1.2).abs() < 0.01);
    assert!((resized.height - start.height * 1.2).abs() < 0.01);
    assert!((resized.x - start.x).abs() < 0.01 && (resized.y - start.y).abs() < 0.01);
}

#[test]
fn releasing_pointer_ends_drag() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let id = app.session.apply(SessionAction::AddText).expect("text added");
    let grab = pos(app.session.element(id).expect("element exists").rect().center());

    run_canvas(&ctx, &mut app, vec![egui::Event::PointerMoved(grab)]);
    run_canvas(&ctx, &mut app, press(grab));
    run_canvas(
        &ctx,
        &mut app,
        vec![egui::Event::PointerButton {
            pos: grab,
            button: egui::PointerButton::Primary,
            pressed: false,
            modifiers: egui::Modifiers::NONE,
        }],
    );
    assert!(app.drag.is_none());
    assert_eq!(app.session.selected(), Some(id));
}

#[test]
fn delete_key_removes_selected_element() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let keep = app.session.apply(SessionAction::AddText).expect("text added");
    let remove = app.session.apply(SessionAction::AddText).expect("text added");
    assert_eq!(app.session.selected(), Some(remove));

    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(screen());
    raw.events = key(egui::Key::Delete);
    let _ = ctx.run(raw, |ctx| {
        // The app normally calls this from update(); we call it directly for unit testing
        app.handle_delete_key(ctx);
    });

    assert!(app.session.element(remove).is_none());
    assert!(app.session.element(keep).is_some());
    assert_eq!(app.session.selected(), None);
}

#[test]
fn delete_key_without_selection_is_ignored() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    app.session.apply(SessionAction::AddText);
    app.session.apply(SessionAction::Select(None));

    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(screen());
    raw.events = key(egui::Key::Backspace);
    let _ = ctx.run(raw, |ctx| app.handle_delete_key(ctx));

    assert_eq!(app.session.elements().len(), 1);
}

#[test]
fn text_editor_changes_reach_the_element() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let id = app.session.apply(SessionAction::AddText).expect("text added");

    let mut editor = TextEditorState::default();
    editor.load(app.session.element(id).expect("element exists"));
    assert_eq!(editor.editing, Some(id));
    assert_eq!(editor.text, "EDIT ME");
    assert_eq!(editor.size_px, 24.0);
    assert_eq!(editor.align, TextAlign::Center);

    editor.text = "big sale\nnow".to_string();
    editor.size_px = 48.0;
    editor.italic = true;
    editor.align = TextAlign::Left;
    app.session.apply(SessionAction::EditText {
        id,
        markup: editor.to_markup(),
    });

    let element = app.session.element(id).expect("element exists");
    assert_eq!(element.font_size, Some(48.0));
    let style = TextStyle::from_element(element);
    assert_eq!(style.lines, vec!["BIG SALE".to_string(), "NOW".to_string()]);
    assert!(style.italic);
    assert_eq!(style.text_align, TextAlign::Left);

    // Reloading shows the upper-cased text
    let mut reloaded = TextEditorState::default();
    reloaded.load(element);
    assert_eq!(reloaded.text, "BIG SALE\nNOW");
    assert_eq!(reloaded.size_px, 48.0);
}

#[test]
fn picking_unloaded_image_places_it_once_ready() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    let source = "/images/people/1700000000000-face.png";

    app.place_image(ElementKind::Person, source);
    assert!(app.pending_placement.is_some());
    assert!(app.session.elements().is_empty());

    let pixels = [200u8; 2 * 3 * 4];
    let image = egui::ColorImage::from_rgba_unmultiplied([2, 3], &pixels);
    app.textures.insert(&ctx, source, Size::new(200.0, 300.0), image);
    app.handle_task_results(&ctx);

    assert!(app.pending_placement.is_none());
    let element = &app.session.elements()[0];
    assert_eq!(element.kind, ElementKind::Person);
    assert_eq!(element.content, source);
    assert!((element.size.height - 150.0).abs() < 0.01);
    assert!((element.size.width - 100.0).abs() < 0.01);
}

#[test]
fn export_result_becomes_alert() {
    let mut app = BillboardApp::new(AppConfig::default(), None);

    app.handle_export_result(Ok(ExportReport {
        width: 2000,
        height: 1200,
        skipped: vec![ElementId::new_v4()],
        saved_to: Some(PathBuf::from("out/billboard-hq.png")),
    }));
    let alert = app.alert.take().expect("alert shown");
    assert!(alert.message.contains("Saved 2000x1200 image"));
    assert!(alert.message.contains("1 image(s)"));

    app.handle_export_result(Err(ExportError::Background("missing".into())));
    let alert = app.alert.take().expect("alert shown");
    assert_eq!(alert.title, "Error");
    assert!(alert.message.starts_with("Failed to save image:"));
    assert!(alert.message.contains("missing"));
}

#[test]
fn export_without_runtime_reports_error() {
    let ctx = egui::Context::default();
    let mut app = BillboardApp::new(AppConfig::default(), None);
    app.start_export(&ctx, true);
    assert!(!app.coordinator.is_busy());
    assert_eq!(app.alert.as_ref().map(|a| a.title.as_str()), Some("Error"));
}

#[test]
fn full_frame_draws_with_windows_open() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    app.session.apply(SessionAction::AddText);
    app.show_info = true;
    app.alert = Some(super::state::Alert::info("hello"));

    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(screen());
    let _ = ctx.run(raw, |ctx| app.draw_frame(ctx));

    assert!(app.show_info);
    assert!(app.alert.is_some());
    assert!(app.prefs.sidebar_width >= 220.0);
}

#[test]
fn preferences_fill_missing_fields() {
    let prefs: Preferences = serde_json::from_str(r#"{"dark_mode": false}"#).unwrap();
    assert!(!prefs.dark_mode);
    assert_eq!(prefs.sidebar_width, 300.0);
    assert_eq!(prefs.window_inner_size, None);
}

#[test]
fn library_delete_waits_for_confirmation() {
    let public = std::env::temp_dir().join(format!("billboard-public-{}", uuid::Uuid::new_v4()));
    let logos = public.join("images").join("logos");
    std::fs::create_dir_all(&logos).unwrap();
    let file = logos.join("brand.png");
    std::fs::write(&file, b"png").unwrap();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = AppConfig {
        public_dir: public.clone(),
        ..AppConfig::default()
    };
    let mut app = BillboardApp::new(config, Some(runtime.handle().clone()));

    // The context menu only asks; nothing is removed yet
    app.pending_delete = Some("/images/logos/brand.png".to_string());
    app.confirm_pending_delete(false);
    assert!(app.pending_delete.is_none());
    assert!(file.exists());

    app.pending_delete = Some("/images/logos/brand.png".to_string());
    app.confirm_pending_delete(true);
    match app.task_receiver.recv_timeout(std::time::Duration::from_secs(5)) {
        Ok(super::state::TaskResult::Deleted(url)) => assert_eq!(url, "/images/logos/brand.png"),
        other => panic!("unexpected result {other:?}"),
    }
    assert!(!file.exists());

    std::fs::remove_dir_all(&public).unwrap();
}

#[test]
fn delete_confirmation_window_is_shown() {
    let ctx = egui::Context::default();
    let mut app = app_with_background(&ctx);
    app.pending_delete = Some("/images/people/a.png".to_string());

    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(screen());
    let _ = ctx.run(raw, |ctx| app.draw_frame(ctx));

    // Still waiting for an answer
    assert_eq!(app.pending_delete.as_deref(), Some("/images/people/a.png"));
}
