// src/matchmaker.rs
//! Picks two headlines from different sources and decides how to join them.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::MashupError;
use crate::headlines::{distinct_sources, Headline};

pub const TOKEN_BYTES: usize = 16;

/// Two headlines from distinct sources, joined into one.
#[derive(Debug, Clone)]
pub struct Pairing {
    pub first: Arc<Headline>,
    pub second: Arc<Headline>,
    pub separator: &'static str,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Pairing {
    /// Plain text title: `first + separator + " " + second`.
    pub fn title(&self) -> String {
        format!("{}{} {}", self.first.text, self.separator, self.second.text)
    }

    /// HTML markup; each part links to its source when it has one.
    pub fn markup(&self) -> String {
        format!(
            "{}{} {}",
            headline_markup(&self.first),
            self.separator,
            headline_markup(&self.second)
        )
    }

    pub fn urls(&self) -> [&str; 2] {
        [&self.first.url, &self.second.url]
    }
}

fn headline_markup(h: &Headline) -> String {
    let text = html_escape::encode_text(&h.text);
    if h.url.is_empty() {
        text.into_owned()
    } else {
        format!(
            r#"<a href="{}">{}</a>"#,
            html_escape::encode_double_quoted_attribute(&h.url),
            text
        )
    }
}

/// A first headline ending like this already carries its own separator.
pub fn separator_for(first: &str) -> &'static str {
    match first.chars().last() {
        Some('?' | '!' | ':') => "",
        _ => ":",
    }
}

/// 16 random bytes, lowercase hex.
pub fn generate_token<R: Rng>(rng: &mut R) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes[..]);
    let mut out = String::with_capacity(TOKEN_BYTES * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Draw a pairing from `pool`.
///
/// Fails fast when the pool cannot produce two distinct sources, instead of
/// rejection sampling forever.
pub fn draw<R: Rng>(
    pool: &[Arc<Headline>],
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Pairing, MashupError> {
    let distinct = distinct_sources(pool);
    if distinct < 2 {
        return Err(MashupError::InsufficientDiversity { distinct });
    }

    let i = rng.random_range(0..pool.len());
    let mut j = rng.random_range(0..pool.len());
    while pool[j].url == pool[i].url {
        j = rng.random_range(0..pool.len());
    }

    let (first, second) = if pool[i].text.chars().count() > pool[j].text.chars().count() {
        (&pool[j], &pool[i])
    } else {
        (&pool[i], &pool[j])
    };

    Ok(Pairing {
        first: Arc::clone(first),
        second: Arc::clone(second),
        separator: separator_for(&first.text),
        token: generate_token(rng),
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(items: &[(&str, &str)]) -> Vec<Arc<Headline>> {
        items
            .iter()
            .map(|(t, u)| Arc::new(Headline::new(*t, *u, 0)))
            .collect()
    }

    #[test]
    fn empty_or_single_source_pool_fails_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = draw(&[], &mut rng, Utc::now()).unwrap_err();
        assert!(matches!(err, MashupError::InsufficientDiversity { distinct: 0 }));

        let p = pool(&[("A", "u1"), ("B", "u1"), ("C", "u1")]);
        let err = draw(&p, &mut rng, Utc::now()).unwrap_err();
        assert!(matches!(err, MashupError::InsufficientDiversity { distinct: 1 }));
        assert!(err.is_retryable());
    }

    #[test]
    fn draws_distinct_sources_shorter_first() {
        let p = pool(&[
            ("Short", "u1"),
            ("A much longer headline", "u2"),
            ("Mid length one", "u3"),
            ("Same source as short", "u1"),
        ]);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let m = draw(&p, &mut rng, Utc::now()).unwrap();
            assert_ne!(m.first.url, m.second.url);
            assert!(m.first.text.chars().count() <= m.second.text.chars().count());
            assert_eq!(m.separator, separator_for(&m.first.text));
        }
    }

    #[test]
    fn separator_follows_trailing_punctuation() {
        assert_eq!(separator_for("Really?"), "");
        assert_eq!(separator_for("Wow!"), "");
        assert_eq!(separator_for("Note:"), "");
        assert_eq!(separator_for("Plain"), ":");
        assert_eq!(separator_for(""), ":");
    }

    #[test]
    fn tokens_are_hex_and_unique() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = generate_token(&mut rng);
        let b = generate_token(&mut rng);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn title_and_markup() {
        let p = pool(&[("Hvad nu?", "http://a/1"), ("Katten & hunden", "")]);
        let m = Pairing {
            first: p[0].clone(),
            second: p[1].clone(),
            separator: separator_for(&p[0].text),
            token: "t".into(),
            created_at: Utc::now(),
        };
        assert_eq!(m.title(), "Hvad nu? Katten & hunden");
        assert_eq!(
            m.markup(),
            r#"<a href="http://a/1">Hvad nu?</a> Katten &amp; hunden"#
        );
    }
}
