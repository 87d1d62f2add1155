mod common;

use letterpress::{
    Alignment, EngineOptions, Error, FontSpec, Position, fonts::StandardFace, layout_field,
    render_field, render_field_with,
};
use rayon::prelude::*;

fn font(family: &str, size: f32, alignment: Alignment) -> FontSpec {
    FontSpec {
        family: family.to_string(),
        size,
        color: "#000000".parse().unwrap(),
        alignment,
    }
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn centered_name_on_landscape_page() {
    let template = common::pdf_template(800, 600);
    let position = Position::new(100.0, 200.0, 300.0, 50.0);
    let spec = font("Helvetica", 36.0, Alignment::Center);

    let out = render_field(&template, "Jane Doe", &position, &spec).unwrap();
    let doc = common::load(&out);
    let pages = common::page_ids(&doc);
    assert_eq!(pages.len(), 1);

    let drawn = common::engine_text(&doc, pages[0]);
    assert_eq!(drawn.len(), 1);
    let name = &drawn[0];
    assert_eq!(name.text, "Jane Doe");
    assert_eq!(name.size, 36.0);
    assert_eq!(name.color, [0.0, 0.0, 0.0]);
    assert!(approx(name.y, 357.0), "y = {}", name.y);

    let width = StandardFace::Helvetica.text_width("Jane Doe", 36.0);
    assert!(approx(name.x + width / 2.0, 250.0), "x = {}", name.x);
    assert_eq!(common::base_font(&doc, pages[0], &name.font), "Helvetica");
}

#[test]
fn template_artwork_is_kept_underneath() {
    let template = common::pdf_template(800, 600);
    let original = common::load(&template);
    let original_page = common::page_ids(&original)[0];
    let background_id = common::content_ids(&original, original_page)[0];
    let background = original.get_object(background_id).unwrap().as_stream().unwrap().content.clone();

    let out = render_field(
        &template,
        "Jane Doe",
        &Position::new(100.0, 200.0, 300.0, 50.0),
        &FontSpec::default(),
    )
    .unwrap();
    let doc = common::load(&out);
    let page = common::page_ids(&doc)[0];

    let ids = common::content_ids(&doc, page);
    assert_eq!(ids.len(), 3, "save-state, artwork, overlay");
    assert_eq!(ids[1], background_id);
    let kept = doc.get_object(background_id).unwrap().as_stream().unwrap();
    assert_eq!(kept.content, background);

    // The artwork still finds its own font.
    let artwork: Vec<_> = common::drawn_text(&doc, page)
        .into_iter()
        .filter(|t| t.font == b"F1")
        .collect();
    assert_eq!(artwork.len(), 1);
    assert_eq!(common::base_font(&doc, page, b"F1"), "Times-Roman");
}

#[test]
fn center_alignment_puts_midpoint_on_box_center() {
    let cases = [
        (0.0, 40.0, "A"),
        (50.0, 500.0, "Jane Doe"),
        (12.5, 220.0, "Dr. Maria-Luisa O'Neill"),
        (300.0, 90.0, "Li"),
    ];
    for (x, width, text) in cases {
        for size in [8.0, 12.0, 24.0] {
            let position = Position::new(x, 100.0, width, 40.0);
            let p = layout_field(792.0, text, &position, size, Alignment::Center, StandardFace::Helvetica);
            if p.text_width <= width {
                assert!(approx(p.x + p.text_width / 2.0, x + width / 2.0), "{text} @ {size}");
            } else {
                assert_eq!(p.x, x, "{text} @ {size} overflows");
            }
        }
    }
}

#[test]
fn right_alignment_ends_on_box_edge() {
    let position = Position::new(100.0, 50.0, 400.0, 30.0);
    for text in ["Jane Doe", "W", "Christopher Columbus"] {
        let p = layout_field(600.0, text, &position, 18.0, Alignment::Right, StandardFace::TimesRoman);
        assert!(p.text_width < position.width);
        assert!(approx(p.x + p.text_width, 500.0));
    }
}

#[test]
fn left_alignment_and_overflow_start_at_box_edge() {
    let position = Position::new(100.0, 50.0, 60.0, 30.0);
    let left = layout_field(600.0, "Jane", &position, 12.0, Alignment::Left, StandardFace::Courier);
    assert_eq!(left.x, 100.0);

    for alignment in [Alignment::Center, Alignment::Right] {
        let wide = layout_field(
            600.0,
            "Bartholomew Fitzgerald",
            &position,
            36.0,
            alignment,
            StandardFace::Helvetica,
        );
        assert!(wide.text_width > position.width);
        assert_eq!(wide.x, 100.0);
    }
}

#[test]
fn vertical_origin_centers_the_font_band() {
    let position = Position::new(0.0, 10.0, 100.0, 80.0);
    let p = layout_field(842.0, "x", &position, 20.0, Alignment::Left, StandardFace::Helvetica);
    assert!(approx(p.y, 842.0 - 10.0 - 50.0));
}

#[test]
fn rendering_is_deterministic() {
    let template = common::pdf_template(612, 792);
    let position = Position::new(72.0, 300.0, 468.0, 60.0);
    let spec = font("Times-Bold", 28.0, Alignment::Center);
    let a = render_field(&template, "Ada Lovelace", &position, &spec).unwrap();
    let b = render_field(&template, "Ada Lovelace", &position, &spec).unwrap();
    assert_eq!(a, b);
}

#[test]
fn concurrent_renders_share_one_template() {
    let template = common::pdf_template(612, 792);
    let position = Position::new(72.0, 300.0, 468.0, 60.0);
    let spec = FontSpec::default();
    let names: Vec<String> = (0..16).map(|i| format!("Recipient {i}")).collect();

    let outputs: Vec<Vec<u8>> = names
        .par_iter()
        .map(|name| render_field(&template, name, &position, &spec).unwrap())
        .collect();

    for (name, out) in names.iter().zip(&outputs) {
        let doc = common::load(out);
        let drawn = common::engine_text(&doc, common::page_ids(&doc)[0]);
        assert_eq!(&drawn[0].text, name);
    }
}

#[test]
fn family_picks_face_and_metrics() {
    let template = common::pdf_template(612, 792);
    let position = Position::new(0.0, 0.0, 612.0, 100.0);
    let spec = font("times-bold", 20.0, Alignment::Right);

    let out = render_field(&template, "Grace Hopper", &position, &spec).unwrap();
    let doc = common::load(&out);
    let page = common::page_ids(&doc)[0];
    let drawn = &common::engine_text(&doc, page)[0];
    assert_eq!(common::base_font(&doc, page, &drawn.font), "Times-Bold");

    let width = StandardFace::TimesBold.text_width("Grace Hopper", 20.0);
    assert!(approx(drawn.x, 612.0 - width));
}

#[test]
fn unknown_family_falls_back_unless_rejected() {
    let template = common::pdf_template(612, 792);
    let position = Position::new(0.0, 0.0, 612.0, 100.0);
    let spec = font("Comic Sans MS", 20.0, Alignment::Center);

    let out = render_field(&template, "Jane Doe", &position, &spec).unwrap();
    let doc = common::load(&out);
    let page = common::page_ids(&doc)[0];
    let drawn = &common::engine_text(&doc, page)[0];
    assert_eq!(common::base_font(&doc, page, &drawn.font), "Helvetica");

    let strict = EngineOptions::new().reject_unknown_fonts();
    let err = render_field_with(&template, "Jane Doe", &position, &spec, &strict).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFontFamily(ref f) if f == "Comic Sans MS"));
}

#[test]
fn inherited_page_attributes_are_honoured() {
    let template = common::pdf_template_inherited(800, 600);
    let position = Position::new(100.0, 200.0, 300.0, 50.0);

    let out = render_field(&template, "Jane Doe", &position, &FontSpec::default()).unwrap();
    let doc = common::load(&out);
    let page = common::page_ids(&doc)[0];
    assert_eq!(common::media_box(&doc, page), vec![0.0, 0.0, 800.0, 600.0]);

    let drawn = &common::engine_text(&doc, page)[0];
    assert!(approx(drawn.y, 357.0));
    assert_eq!(common::base_font(&doc, page, b"F1"), "Times-Roman");
    assert_eq!(common::base_font(&doc, page, &drawn.font), "Helvetica");
}

#[test]
fn line_breaks_are_flattened() {
    let template = common::pdf_template(612, 792);
    let out = render_field(
        &template,
        "Jane\r\nDoe\n",
        &Position::new(0.0, 0.0, 612.0, 100.0),
        &FontSpec::default(),
    )
    .unwrap();
    let doc = common::load(&out);
    let drawn = common::engine_text(&doc, common::page_ids(&doc)[0]);
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].text, "Jane Doe");
}

#[test]
fn colour_is_applied() {
    let template = common::pdf_template(612, 792);
    let mut spec = FontSpec::default();
    spec.color = "#ff8000".parse().unwrap();
    let out = render_field(&template, "Jane", &Position::new(0.0, 0.0, 300.0, 50.0), &spec).unwrap();
    let doc = common::load(&out);
    let drawn = &common::engine_text(&doc, common::page_ids(&doc)[0])[0];
    assert!(approx(drawn.color[0], 1.0));
    assert!(approx(drawn.color[1], 128.0 / 255.0));
    assert!(approx(drawn.color[2], 0.0));
}

#[test]
fn invalid_input_is_rejected() {
    let template = common::pdf_template(612, 792);
    let good = Position::new(10.0, 10.0, 100.0, 30.0);
    let spec = FontSpec::default();

    let err = render_field(b"not a pdf", "Jane", &good, &spec).unwrap_err();
    assert!(matches!(err, Error::TemplateParse(_)), "{err}");

    let err = render_field(&template, "  \n ", &good, &spec).unwrap_err();
    assert!(matches!(err, Error::InvalidField(_)));

    let mut second_page = good;
    second_page.page = 1;
    let err = render_field(&template, "Jane", &second_page, &spec).unwrap_err();
    assert!(matches!(err, Error::InvalidField(_)));

    let flat = Position::new(10.0, 10.0, 100.0, 0.0);
    assert!(matches!(
        render_field(&template, "Jane", &flat, &spec),
        Err(Error::InvalidField(_))
    ));

    let huge = FontSpec {
        size: 200.0,
        ..FontSpec::default()
    };
    assert!(matches!(
        render_field(&template, "Jane", &good, &huge),
        Err(Error::InvalidField(_))
    ));
}

#[test]
fn infinite_box_is_rejected() {
    let template = common::pdf_template(612, 792);
    let wide = Position::new(100.0, 200.0, f32::INFINITY, 50.0);
    let err = render_field(&template, "Jane", &wide, &FontSpec::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidField(_)), "{err}");
}

#[test]
fn names_outside_winansi_are_rejected() {
    let template = common::pdf_template(800, 600);
    let position = Position::new(100.0, 200.0, 300.0, 50.0);
    let spec = FontSpec::default();

    for name in ["王小明", "Łukasz Żak"] {
        let err = render_field(&template, name, &position, &spec).unwrap_err();
        let Error::InvalidField(message) = &err else {
            panic!("{name}: unexpected error {err}");
        };
        assert!(message.contains("Helvetica"), "{message}");
    }

    let err = render_field(&template, "Łukasz Żak", &position, &spec).unwrap_err();
    assert!(err.to_string().ends_with(": ŁŻ"), "{err}");

    // Latin-1 and the Windows-1252 extras are placed by their full width.
    let name = "Zoë Šaro Œuvre";
    let out = render_field(&template, name, &position, &spec).unwrap();
    let doc = common::load(&out);
    let drawn = common::engine_text(&doc, common::page_ids(&doc)[0]);
    let expected = layout_field(
        600.0,
        name,
        &position,
        spec.size,
        spec.alignment,
        StandardFace::Helvetica,
    );
    assert_eq!(drawn.len(), 1);
    assert!(approx(drawn[0].x, expected.x));
    assert!(expected.text_width > StandardFace::Helvetica.text_width("Zo aro uvre", spec.size));
}
