use glint_data::KerningPair;

/// Collects the non-zero kerning adjustments between every ordered pair of
/// `chars`, using `kern` to query the font.
pub fn extract_kerning(
    chars: &[char],
    kern: impl Fn(char, char) -> Option<f32>,
) -> Vec<KerningPair> {
    chars
        .iter()
        .flat_map(|&left| chars.iter().map(move |&right| (left, right)))
        .filter_map(|(left, right)| {
            kern(left, right)
                .filter(|adjust| *adjust != 0.0 && adjust.is_finite())
                .map(|adjust| KerningPair { left, right, adjust })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kern(left: char, right: char) -> Option<f32> {
        match (left, right) {
            ('A', 'V') | ('V', 'A') => Some(-1.25),
            ('T', 'o') => Some(-0.75),
            ('o', 'o') => Some(0.0),
            _ => None,
        }
    }

    #[test]
    fn keeps_only_non_zero_pairs() {
        let pairs = extract_kerning(&['A', 'V', 'T', 'o'], kern);

        let found: Vec<_> = pairs.iter().map(|p| (p.left, p.right, p.adjust)).collect();
        assert_eq!(found, vec![('A', 'V', -1.25), ('V', 'A', -1.25), ('T', 'o', -0.75)]);
    }

    #[test]
    fn pairs_are_ordered() {
        let pairs = extract_kerning(&['o', 'T'], kern);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].left, pairs[0].right), ('T', 'o'));
    }

    #[test]
    fn no_chars_no_pairs() {
        assert!(extract_kerning(&[], kern).is_empty());
    }
}
