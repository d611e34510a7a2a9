//! Fixed capacity strings for metric labels.
//!
//! Labels are recorded on every tracked message, so they are stored inline
//! instead of allocating a [`std::string::String`] per event.

/// A UTF-8 string stored inline with a capacity of `N` bytes.
pub type FixedString<const N: usize> = heapless::String<N>;

/// The label type used by all metric events.
pub type Label = FixedString<64>;

/// Copies `s` into a [`FixedString`].
///
/// Inputs longer than `N` bytes are truncated to the last char boundary that
/// fits.
pub fn truncate<const N: usize>(s: &str) -> FixedString<N> {
    let mut len = s.len().min(N);
    while !s.is_char_boundary(len) {
        len -= 1;
    }

    let mut buf = FixedString::new();
    // `len <= N` so this always fits.
    buf.push_str(&s[..len]).ok();
    buf
}

/// Copies `s` into a [`Label`], truncating it if necessary.
#[inline]
pub fn label(s: &str) -> Label {
    truncate(s)
}
