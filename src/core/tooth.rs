//! FDI-Zahnnummern, Kiefer-Zuordnung und anatomische Reihenfolgen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kiefer (Ober- oder Unterkiefer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jaw {
    /// Oberkiefer (Quadranten 1 und 2)
    Upper,
    /// Unterkiefer (Quadranten 3 und 4)
    Lower,
}

impl Jaw {
    /// Beide Kiefer in fester Reihenfolge.
    pub const ALL: [Jaw; 2] = [Jaw::Upper, Jaw::Lower];

    /// Anzeigename des Kiefers.
    pub fn label(self) -> &'static str {
        match self {
            Jaw::Upper => "upper",
            Jaw::Lower => "lower",
        }
    }
}

/// Zahn-Identifikator nach FDI-Schema (11–18, 21–28, 31–38, 41–48).
///
/// Nur über [`ToothId::new`] konstruierbar, damit ungültige Codes gar nicht
/// erst in den Landmark-Store gelangen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ToothId(u8);

impl ToothId {
    /// Validiert einen zweistelligen FDI-Code.
    pub fn new(code: u8) -> Option<Self> {
        let quadrant = code / 10;
        let position = code % 10;
        if (1..=4).contains(&quadrant) && (1..=8).contains(&position) {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Parst einen FDI-Code aus Text (z.B. JSON-Map-Schlüssel `"16"`).
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<u8>().ok().and_then(Self::new)
    }

    /// Roher FDI-Code.
    pub fn code(self) -> u8 {
        self.0
    }

    /// Quadrant 1–4.
    pub fn quadrant(self) -> u8 {
        self.0 / 10
    }

    /// Position im Quadranten (1 = zentraler Schneidezahn, 8 = Weisheitszahn).
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    /// Kiefer, zu dem der Zahn gehört.
    pub fn jaw(self) -> Jaw {
        match self.quadrant() {
            1 | 2 => Jaw::Upper,
            _ => Jaw::Lower,
        }
    }

    /// Antagonist im Gegenkiefer an gleicher Position und Seite (16 ↔ 46, 21 ↔ 31).
    pub fn antagonist(self) -> Self {
        let quadrant = match self.quadrant() {
            1 => 4,
            2 => 3,
            3 => 2,
            _ => 1,
        };
        Self(quadrant * 10 + self.position())
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// FDI-Codes eines Kiefers von rechts-posterior über anterior nach links-posterior.
fn arch_order_codes(jaw: Jaw) -> [u8; 16] {
    let (right, left) = match jaw {
        Jaw::Upper => (1u8, 2u8),
        Jaw::Lower => (4u8, 3u8),
    };
    let mut codes = [0u8; 16];
    for i in 0..8u8 {
        // rechts: 8 → 1, links: 1 → 8
        codes[i as usize] = right * 10 + (8 - i);
        codes[8 + i as usize] = left * 10 + (i + 1);
    }
    codes
}

/// Zähne eines Kiefers in anatomischer Bogenreihenfolge
/// (rechts-posterior → rechts-anterior → links-anterior → links-posterior).
pub fn arch_order(jaw: Jaw) -> Vec<ToothId> {
    arch_order_codes(jaw)
        .into_iter()
        .filter_map(ToothId::new)
        .collect()
}

/// Die 16 kanonischen Ober-/Unterkiefer-Paare von rechts-posterior nach links-posterior.
///
/// Jedes Paar ist `(oberer Zahn, Antagonist)`, z.B. `(18, 48)` … `(11, 41)`,
/// `(21, 31)` … `(28, 38)`.
pub fn canonical_pairs() -> Vec<(ToothId, ToothId)> {
    arch_order(Jaw::Upper)
        .into_iter()
        .map(|upper| (upper, upper.antagonist()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooth_id_rejects_invalid_codes() {
        assert!(ToothId::new(11).is_some());
        assert!(ToothId::new(48).is_some());
        assert!(ToothId::new(10).is_none());
        assert!(ToothId::new(19).is_none());
        assert!(ToothId::new(51).is_none());
        assert!(ToothId::parse(" 36 ").is_some());
        assert!(ToothId::parse("abc").is_none());
    }

    #[test]
    fn test_jaw_and_antagonist() {
        let t = ToothId::new(16).unwrap();
        assert_eq!(t.jaw(), Jaw::Upper);
        assert_eq!(t.antagonist().code(), 46);
        assert_eq!(ToothId::new(21).unwrap().antagonist().code(), 31);
        assert_eq!(ToothId::new(37).unwrap().jaw(), Jaw::Lower);
    }

    #[test]
    fn test_arch_order_upper_runs_right_posterior_to_left_posterior() {
        let codes: Vec<u8> = arch_order(Jaw::Upper).iter().map(|t| t.code()).collect();
        assert_eq!(codes.len(), 16);
        assert_eq!(codes[0], 18);
        assert_eq!(codes[7], 11);
        assert_eq!(codes[8], 21);
        assert_eq!(codes[15], 28);
    }

    #[test]
    fn test_arch_order_lower_uses_quadrants_4_then_3() {
        let codes: Vec<u8> = arch_order(Jaw::Lower).iter().map(|t| t.code()).collect();
        assert_eq!(&codes[..2], &[48, 47]);
        assert_eq!(&codes[14..], &[37, 38]);
    }

    #[test]
    fn test_canonical_pairs() {
        let pairs = canonical_pairs();
        assert_eq!(pairs.len(), 16);
        assert_eq!((pairs[0].0.code(), pairs[0].1.code()), (18, 48));
        assert_eq!((pairs[8].0.code(), pairs[8].1.code()), (21, 31));
    }
}
