//! Random color helper for new drawers. Has no interaction with the board.

use rand::Rng;

/// Largest 24-bit RGB value.
const MAX_RGB: u32 = 0xFF_FFFF;

/// Random `#RRGGBB` color with uppercase hex digits.
#[must_use]
pub fn random_color() -> String {
    random_color_with(&mut rand::rng())
}

/// Same as `random_color`, drawing from `rng`.
pub fn random_color_with(rng: &mut impl Rng) -> String {
    format!("#{:06X}", rng.random_range(0..=MAX_RGB))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn is_hex_color(s: &str) -> bool {
        s.len() == 7
            && s.starts_with('#')
            && s[1..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn random_color_is_six_uppercase_hex_digits() {
        for _ in 0..200 {
            let color = random_color();
            assert!(is_hex_color(&color), "bad color: {color}");
        }
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let a = random_color_with(&mut StdRng::seed_from_u64(7));
        let b = random_color_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(is_hex_color(&a));
    }
}
