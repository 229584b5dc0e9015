use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_regex::Regex as RandRegex;

use crate::errors::DrawError;

const DEFAULT_MAX_REPEAT: u32 = 32;

/// Characters mixed into unconstrained strings. Besides plain ASCII this
/// carries whitespace, YAML and template metacharacters and a few
/// multi-byte code points, which are the inputs renderers tend to trip on.
const STRING_POOL: &[char] = &[
    'a', 'b', 'c', 'x', 'y', 'z', 'A', 'M', 'Z', '0', '1', '7', '9', '-', '_', '.', '/', ' ',
    ' ', '\t', '\n', ':', '#', '{', '}', '[', ']', '"', '\'', '&', '*', '!', '|', '>', '%', '@',
    '`', '$', '\\', ',', '?', '=', 'é', 'ß', 'Ж', '中', '🚀', '\u{200b}',
];

/// Source of primitive random decisions.
pub trait Draw {
    fn draw_bool(&mut self) -> bool;

    /// Uniform integer in `[min, max]`. Returns `min` when the range is empty.
    fn draw_int(&mut self, min: i64, max: i64) -> i64;

    /// Float in `[min, max]`. Returns `min` when the range is empty.
    fn draw_float(&mut self, min: f64, max: f64) -> f64;

    /// String of exactly `len` characters.
    fn draw_string(&mut self, len: usize) -> String;

    /// String matching `pattern`.
    fn draw_matching(&mut self, pattern: &str) -> Result<String, DrawError>;

    /// Uniform index into a collection of `len` elements.
    fn draw_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let last = i64::try_from(len - 1).unwrap_or(i64::MAX);
        usize::try_from(self.draw_int(0, last)).unwrap_or(0)
    }
}

/// [`Draw`] over a seeded ChaCha8 stream, so a seed replays a session.
#[derive(Debug)]
pub struct RngDraw {
    rng: ChaCha8Rng,
    seed: u64,
    patterns: HashMap<String, Result<RandRegex, String>>,
}

impl RngDraw {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            patterns: HashMap::new(),
        }
    }

    /// Seed taken from the operating system.
    pub fn from_entropy() -> Self {
        Self::seeded(rand::rng().random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Draw for RngDraw {
    fn draw_bool(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    fn draw_int(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    fn draw_float(&mut self, min: f64, max: f64) -> f64 {
        if min >= max || max.is_nan() {
            return min;
        }
        let t: f64 = self.rng.random();
        let mut value = min + (max - min) * t;
        if !value.is_finite() {
            // The span overflowed; interpolate without computing it.
            value = min * (1.0 - t) + max * t;
        }
        value.clamp(min, max)
    }

    fn draw_string(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| STRING_POOL[self.rng.random_range(0..STRING_POOL.len())])
            .collect()
    }

    fn draw_matching(&mut self, pattern: &str) -> Result<String, DrawError> {
        let compiled = self
            .patterns
            .entry(pattern.to_string())
            .or_insert_with(|| {
                RandRegex::compile(strip_anchors(pattern), DEFAULT_MAX_REPEAT)
                    .map_err(|err| err.to_string())
            });
        let regex = compiled.as_ref().map_err(|reason| DrawError::Pattern {
            pattern: pattern.to_string(),
            reason: reason.clone(),
        })?;
        let bytes: Vec<u8> = self.rng.sample(regex);
        String::from_utf8(bytes).map_err(|_| DrawError::NotUtf8 {
            pattern: pattern.to_string(),
        })
    }
}

/// Schema patterns are usually anchored; the sampler only needs the body.
fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(body) if !body.ends_with('\\') => body,
        _ => pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_replays_the_same_draws() {
        let mut first = RngDraw::seeded(42);
        let mut second = RngDraw::seeded(42);
        for _ in 0..50 {
            assert_eq!(first.draw_int(-5, 5), second.draw_int(-5, 5));
            assert_eq!(first.draw_string(6), second.draw_string(6));
        }
    }

    #[test]
    fn empty_ranges_collapse_to_min() {
        let mut draw = RngDraw::seeded(1);
        assert_eq!(draw.draw_int(3, 3), 3);
        assert_eq!(draw.draw_int(9, 2), 9);
        assert_eq!(draw.draw_float(1.5, 1.5), 1.5);
        assert_eq!(draw.draw_index(0), 0);
        assert_eq!(draw.draw_index(1), 0);
    }

    #[test]
    fn float_draw_survives_extreme_bounds() {
        let mut draw = RngDraw::seeded(2);
        for _ in 0..100 {
            let value = draw.draw_float(f64::MIN, f64::MAX);
            assert!(value.is_finite());
        }
    }

    #[test]
    fn strings_have_exact_char_length() {
        let mut draw = RngDraw::seeded(3);
        for len in [0, 1, 17, 100] {
            assert_eq!(draw.draw_string(len).chars().count(), len);
        }
    }

    #[test]
    fn matching_strings_follow_the_pattern() {
        let mut draw = RngDraw::seeded(4);
        let checker = regex::Regex::new("^[a-z]{3}-[0-9]{2}$").expect("regex");
        for _ in 0..20 {
            let value = draw.draw_matching("^[a-z]{3}-[0-9]{2}$").expect("draw");
            assert!(checker.is_match(&value), "{value}");
        }
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut draw = RngDraw::seeded(5);
        let err = draw.draw_matching("([unclosed").expect_err("invalid");
        assert!(matches!(err, DrawError::Pattern { .. }));
        // Cached failures are reported again.
        assert!(draw.draw_matching("([unclosed").is_err());
    }

    #[test]
    fn anchors_are_stripped() {
        assert_eq!(strip_anchors("^abc$"), "abc");
        assert_eq!(strip_anchors("abc\\$"), "abc\\$");
        assert_eq!(strip_anchors("abc"), "abc");
    }
}
