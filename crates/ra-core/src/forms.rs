//! # Form validation
//!
//! Raw submitted values in, validated drafts or per-field errors out.
//! Handlers re-render the form with the errors; nothing here touches storage.

use uuid::Uuid;

use crate::humanize::naturalsize;
use crate::models::{Ad, Picture};
use crate::tags::{join_tags, parse_tags};

pub const TITLE_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 200;
pub const COMMENT_MIN_CHARS: usize = 3;
pub const PRICE_MAX_DIGITS: usize = 7;
pub const PRICE_DECIMAL_PLACES: usize = 2;
/// Cap on the raw text and tags values. The multipart reader stops
/// buffering a field one byte past it.
pub const TEXT_MAX_BYTES: usize = 64 * 1024;

const REQUIRED: &str = "This field is required.";

/// Ad form values as submitted (or as pre-filled from an existing ad).
#[derive(Debug, Clone, Default)]
pub struct AdInput {
    pub title: String,
    pub price: String,
    pub text: String,
    pub tags: String,
    /// A freshly uploaded file, if any
    pub picture: Option<Picture>,
}

impl AdInput {
    /// Pre-fill values for the update form.
    pub fn from_ad(ad: &Ad) -> Self {
        Self {
            title: ad.title.clone(),
            price: ad.price_display(),
            text: ad.text.clone(),
            tags: join_tags(&ad.tags),
            picture: None,
        }
    }
}

/// A validated ad, ready to persist.
#[derive(Debug, Clone)]
pub struct AdDraft {
    pub title: String,
    pub price_cents: Option<i64>,
    pub text: String,
    pub tags: Vec<String>,
    /// `None` keeps whatever picture is already stored
    pub picture: Option<Picture>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdFormErrors {
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub text: Vec<String>,
    pub tags: Vec<String>,
    pub picture: Vec<String>,
}

impl AdFormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.price.is_empty()
            && self.text.is_empty()
            && self.tags.is_empty()
            && self.picture.is_empty()
    }
}

impl AdInput {
    pub fn validate(self, max_upload_bytes: u64) -> Result<AdDraft, AdFormErrors> {
        let mut errors = AdFormErrors::default();

        let title = self.title.trim().to_string();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.title.push(REQUIRED.to_string());
        } else if title_len < TITLE_MIN_CHARS {
            errors.title.push(format!("Title must be greater than {TITLE_MIN_CHARS} characters!"));
        } else if title_len > TITLE_MAX_CHARS {
            errors.title.push(format!(
                "Ensure this value has at most {TITLE_MAX_CHARS} characters (it has {title_len})."
            ));
        }

        let price_cents = match parse_price(&self.price) {
            Ok(cents) => cents,
            Err(msg) => {
                errors.price.push(msg);
                None
            }
        };

        let too_long = || format!("Ensure this value has at most {}.", naturalsize(TEXT_MAX_BYTES as u64));
        let text = self.text.trim().to_string();
        if self.text.len() > TEXT_MAX_BYTES {
            errors.text.push(too_long());
        } else if text.is_empty() {
            errors.text.push(REQUIRED.to_string());
        }
        if self.tags.len() > TEXT_MAX_BYTES {
            errors.tags.push(too_long());
        }

        if let Some(picture) = &self.picture {
            if picture.data.len() as u64 > max_upload_bytes {
                errors.picture.push(format!("File must be < {}", naturalsize(max_upload_bytes)));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AdDraft {
            title,
            price_cents,
            text,
            tags: parse_tags(&self.tags),
            picture: self.picture,
        })
    }
}

/// Parse an optional decimal price into cents.
///
/// Blank input is `Ok(None)`. At most 7 significant digits, at most 2
/// of them after the decimal point.
pub fn parse_price(raw: &str) -> Result<Option<i64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let not_a_number = || "Enter a number.".to_string();
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(not_a_number());
    }

    let whole = whole.trim_start_matches('0');
    let whole_digits = whole.len();
    let digits = whole_digits + frac.len();
    if digits > PRICE_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        ));
    }
    if frac.len() > PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."
        ));
    }
    if whole_digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
        ));
    }

    // Bounded to 5 + 2 digits above, so these parses cannot overflow.
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| not_a_number())? };
    let frac: i64 = format!("{frac:0<2}").parse().map_err(|_| not_a_number())?;
    let cents = whole * 100 + frac;
    Ok(Some(if negative { -cents } else { cents }))
}

/// Comment form values as submitted.
#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub text: String,
}

/// A validated comment on a specific ad.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub ad_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFormErrors {
    pub text: Vec<String>,
}

impl CommentInput {
    pub fn validate(self, ad_id: Uuid) -> Result<CommentDraft, CommentFormErrors> {
        let text = self.text.trim().to_string();
        if text.chars().count() < COMMENT_MIN_CHARS {
            return Err(CommentFormErrors {
                text: vec![format!("Comment must be greater than {COMMENT_MIN_CHARS} characters!")],
            });
        }
        Ok(CommentDraft { ad_id, text })
    }
}
