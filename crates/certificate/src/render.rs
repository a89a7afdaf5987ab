use std::borrow::Cow;

use chrono::{DateTime, Utc};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use captable_equity::{ShareClass, ShareIssuance};

// A4 in PDF points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;

/// Everything the template needs, resolved ahead of rendering.
///
/// Built from an issuance row plus the holder's name and the configured
/// company name; contains no live references so rendering stays a pure
/// function of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateData {
    pub certificate_number: String,
    pub company_name: String,
    pub holder_name: String,
    pub class: ShareClass,
    pub quantity: i64,
    pub price_per_share_cents: i64,
    pub total_value_cents: i64,
    pub issued_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl CertificateData {
    pub fn from_issuance(
        issuance: &ShareIssuance,
        holder_name: impl Into<String>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            certificate_number: issuance.certificate_number.clone(),
            company_name: company_name.into(),
            holder_name: holder_name.into(),
            class: issuance.class,
            quantity: issuance.quantity,
            price_per_share_cents: issuance.price_per_share_cents,
            total_value_cents: issuance.total_value_cents(),
            issued_at: issuance.issued_at,
            notes: issuance.notes.clone(),
        }
    }
}

/// Render a single-page A4 certificate.
///
/// Deterministic: calling this twice with equal `CertificateData` yields
/// byte-identical output.
pub fn render_certificate(data: &CertificateData) -> Vec<u8> {
    let mut pdf = Pdf::new();

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let regular_font_id = Ref::new(4);
    let bold_font_id = Ref::new(5);
    let content_id = Ref::new(6);

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(page_tree_id);
        page.contents(content_id);
        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        fonts.pair(Name(b"F1"), regular_font_id);
        fonts.pair(Name(b"F2"), bold_font_id);
        fonts.finish();
        resources.finish();
        page.finish();
    }

    pdf.type1_font(regular_font_id)
        .base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_font_id)
        .base_font(Name(b"Helvetica-Bold"));

    pdf.stream(content_id, &page_content(data).finish());
    pdf.finish()
}

fn page_content(data: &CertificateData) -> Content {
    let mut content = Content::new();

    // Page border.
    content.set_line_width(2.0);
    content.rect(36.0, 36.0, PAGE_WIDTH - 72.0, PAGE_HEIGHT - 72.0);
    content.stroke();

    let center = PAGE_WIDTH / 2.0;
    let mut y = PAGE_HEIGHT - 130.0;

    text_centered(&mut content, Font::Bold, 18.0, center, y, &data.company_name);
    y -= 44.0;
    text_centered(&mut content, Font::Bold, 24.0, center, y, "SHARE CERTIFICATE");
    y -= 36.0;
    text_centered(
        &mut content,
        Font::Regular,
        11.0,
        center,
        y,
        &format!(
            "Certificate No. {}  |  Issue Date: {}",
            data.certificate_number,
            format_date(data.issued_at)
        ),
    );

    y -= 48.0;
    let body_fit = chars_that_fit(Font::Regular, 12.0, PAGE_WIDTH - 2.0 * MARGIN);
    let body = format!(
        "This is to certify that {} is the registered holder of {} shares of",
        data.holder_name,
        format_quantity(data.quantity)
    );
    text_at(&mut content, Font::Regular, 12.0, MARGIN, y, &clipped(&body, body_fit));
    y -= 18.0;
    let body = format!(
        "{} stock of {}, each share having a par value of {}.",
        data.class,
        data.company_name,
        format_cents(data.price_per_share_cents)
    );
    text_at(&mut content, Font::Regular, 12.0, MARGIN, y, &clipped(&body, body_fit));

    // Detail rows, label column bold.
    y -= 42.0;
    let rows = [
        ("Shareholder Name:", data.holder_name.clone()),
        ("Share Class:", data.class.to_string()),
        ("Number of Shares:", format_quantity(data.quantity)),
        ("Price per Share:", format_cents(data.price_per_share_cents)),
        ("Total Value:", format_cents(data.total_value_cents)),
        ("Issue Date:", format_date(data.issued_at)),
    ];
    let value_fit = chars_that_fit(Font::Regular, 10.0, PAGE_WIDTH - MARGIN - (MARGIN + 130.0));
    for (label, value) in rows {
        text_at(&mut content, Font::Bold, 10.0, MARGIN, y, label);
        text_at(&mut content, Font::Regular, 10.0, MARGIN + 130.0, y, &clipped(&value, value_fit));
        y -= 16.0;
    }

    if let Some(notes) = &data.notes {
        y -= 14.0;
        text_at(&mut content, Font::Bold, 10.0, MARGIN, y, "Notes:");
        let notes_fit = chars_that_fit(Font::Regular, 10.0, PAGE_WIDTH - MARGIN - (MARGIN + 42.0));
        text_at(&mut content, Font::Regular, 10.0, MARGIN + 42.0, y, &clipped(notes, notes_fit));
    }

    // Signature rules.
    let sig_y = 180.0;
    for x in [MARGIN, PAGE_WIDTH - MARGIN - 160.0] {
        content.set_line_width(0.75);
        content.move_to(x, sig_y);
        content.line_to(x + 160.0, sig_y);
        content.stroke();
    }
    text_at(
        &mut content,
        Font::Regular,
        9.0,
        MARGIN,
        sig_y - 14.0,
        "Company Secretary",
    );
    text_at(
        &mut content,
        Font::Regular,
        9.0,
        PAGE_WIDTH - MARGIN - 160.0,
        sig_y - 14.0,
        "Chief Executive Officer",
    );

    text_centered(
        &mut content,
        Font::Regular,
        8.0,
        center,
        100.0,
        "This certificate is evidence of ownership of the shares described herein and is",
    );
    text_centered(
        &mut content,
        Font::Regular,
        8.0,
        center,
        89.0,
        "transferable only on the books of the corporation by the holder hereof.",
    );

    content
}

#[derive(Copy, Clone)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn name(self) -> Name<'static> {
        match self {
            Font::Regular => Name(b"F1"),
            Font::Bold => Name(b"F2"),
        }
    }

    /// Average glyph width as a fraction of the font size, good enough for
    /// centering Helvetica headings.
    fn width_factor(self) -> f32 {
        match self {
            Font::Regular => 0.5,
            Font::Bold => 0.55,
        }
    }
}

fn text_at(content: &mut Content, font: Font, size: f32, x: f32, y: f32, text: &str) {
    content.begin_text();
    content.set_font(font.name(), size);
    content.next_line(x, y);
    content.show(Str(text.as_bytes()));
    content.end_text();
}

fn text_centered(content: &mut Content, font: Font, size: f32, center_x: f32, y: f32, text: &str) {
    let width = estimated_width(font, size, text);
    text_at(content, font, size, center_x - width / 2.0, y, text);
}

/// Estimated run width in points. Counts glyphs, not bytes, so accented
/// names measure the same as their ASCII equivalents.
fn estimated_width(font: Font, size: f32, text: &str) -> f32 {
    text.chars().count() as f32 * size * font.width_factor()
}

/// Glyphs that fit in `width` points, by the same estimate used for centering.
fn chars_that_fit(font: Font, size: f32, width: f32) -> usize {
    (width / (size * font.width_factor())) as usize
}

/// Truncate to `max_chars` glyphs, marking the cut with an ellipsis so
/// overlong values stay inside the fixed template layout.
fn clipped<'a>(text: &'a str, max_chars: usize) -> Cow<'a, str> {
    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    Cow::Owned(format!("{kept}..."))
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}

fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

fn format_quantity(quantity: i64) -> String {
    let digits = quantity.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
