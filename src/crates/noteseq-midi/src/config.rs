use noteseq_core::Defaults;

/// Resolution written by the encoder unless told otherwise (`note_seq`'s standard PPQ)
pub const STANDARD_PPQ: u16 = 220;

/// Settings for [`decode_with`](crate::decode_with)
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Reject inputs larger than this many bytes before parsing
    pub max_bytes: Option<usize>,
    pub defaults: Defaults,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_bytes: None,
            defaults: Defaults::STANDARD,
        }
    }
}

/// Settings for [`encode_with`](crate::encode_with)
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub ticks_per_quarter: u16,
    /// Run [`Score::validate`](noteseq_core::Score::validate) and refuse
    /// unordered tempo or signature lists instead of sorting them
    pub strict: bool,
    pub defaults: Defaults,
}

impl EncodeOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ticks_per_quarter: STANDARD_PPQ,
            strict: false,
            defaults: Defaults::STANDARD,
        }
    }
}
