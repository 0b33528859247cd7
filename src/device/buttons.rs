use std::fmt;

use super::protocol::{switch_number_at, KEY_COUNT, MATRIX_COLS, MATRIX_KEY_COUNT};

/// Key labels indexed by switch number - 1 (SW01..SW70)
pub const KEY_LABELS: [&str; KEY_COUNT] = [
    // SW01-SW06: left line select keys
    "LSK1", "LSK2", "LSK3", "LSK4", "LSK5", "LSK6",
    // SW07-SW12: right line select keys
    "RSK1", "RSK2", "RSK3", "RSK4", "RSK5", "RSK6",
    // SW13-SW27: function keys
    "INIT REF", "RTE", "CLB", "CRZ", "DES",
    "MENU", "LEGS", "DEP ARR", "HOLD", "PROG", "EXEC",
    "N1 LIMIT", "FIX", "PREV PAGE", "NEXT PAGE",
    // SW28-SW53: alpha keys
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M",
    "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
    // SW54-SW57
    "SP", "DEL", "/", "CLR",
    // SW58-SW69: numeric pad, bottom row first
    ".", "0", "+/-", "7", "8", "9", "4", "5", "6", "1", "2", "3",
    // SW70: encoder push-button
    "ENCODER",
];

/// Identity of one physical switch on the CDU
///
/// Dense index 0..69 follows switch numbering; index 69 is the encoder
/// push-button, which is not part of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyIdentity(u8);

impl KeyIdentity {
    pub const EXEC: KeyIdentity = KeyIdentity(22);
    pub const ENCODER_BUTTON: KeyIdentity = KeyIdentity(MATRIX_KEY_COUNT as u8);

    /// Every identity in dense index order
    pub const ALL: [KeyIdentity; KEY_COUNT] = {
        let mut all = [KeyIdentity(0); KEY_COUNT];
        let mut i = 0;
        while i < KEY_COUNT {
            all[i] = KeyIdentity(i as u8);
            i += 1;
        }
        all
    };

    /// Look up the switch wired at a zero-based matrix position
    pub fn at(row: usize, col: usize) -> Option<Self> {
        switch_number_at(row, col).map(|sw| KeyIdentity(sw - 1))
    }

    /// Find an identity by its keycap label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        KEY_LABELS
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label))
            .map(|i| KeyIdentity(i as u8))
    }

    /// Dense index for table lookups
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn label(self) -> &'static str {
        KEY_LABELS[self.index()]
    }

    /// Switch number as silkscreened on the board (1-70)
    pub fn switch_number(self) -> u8 {
        self.0 + 1
    }

    /// Zero-based (row, column), or `None` for the encoder push-button
    pub fn position(self) -> Option<(usize, usize)> {
        if self.is_encoder() {
            None
        } else {
            Some((self.index() / MATRIX_COLS, self.index() % MATRIX_COLS))
        }
    }

    pub fn is_encoder(self) -> bool {
        self == Self::ENCODER_BUTTON
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (SW{:02})", self.label(), self.switch_number())
    }
}
