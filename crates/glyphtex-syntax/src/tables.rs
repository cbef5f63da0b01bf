//! Fixed command tables consulted by the parser.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static GREEK_LETTERS: Lazy<HashMap<&'static str, char>> = Lazy::new(|| {
    HashMap::from([
        ("alpha", '\u{03b1}'),
        ("beta", '\u{03b2}'),
        ("gamma", '\u{03b3}'),
        ("delta", '\u{03b4}'),
        ("epsilon", '\u{03b5}'),
        ("zeta", '\u{03b6}'),
        ("eta", '\u{03b7}'),
        ("theta", '\u{03b8}'),
        ("iota", '\u{03b9}'),
        ("kappa", '\u{03ba}'),
        ("lambda", '\u{03bb}'),
        ("mu", '\u{03bc}'),
        ("nu", '\u{03bd}'),
        ("xi", '\u{03be}'),
        ("omicron", '\u{03bf}'),
        ("pi", '\u{03c0}'),
        ("rho", '\u{03c1}'),
        ("varsigma", '\u{03c2}'),
        ("sigma", '\u{03c3}'),
        ("tau", '\u{03c4}'),
        ("upsilon", '\u{03c5}'),
        ("phi", '\u{03c6}'),
        ("chi", '\u{03c7}'),
        ("psi", '\u{03c8}'),
        ("omega", '\u{03c9}'),
        // The remaining capitals are written with Latin letters (A, B, E, ...).
        ("Gamma", '\u{0393}'),
        ("Delta", '\u{0394}'),
        ("Theta", '\u{0398}'),
        ("Lambda", '\u{039b}'),
        ("Xi", '\u{039e}'),
        ("Pi", '\u{03a0}'),
        ("Sigma", '\u{03a3}'),
        ("Upsilon", '\u{03a5}'),
        ("Phi", '\u{03a6}'),
        ("Psi", '\u{03a8}'),
        ("Omega", '\u{03a9}'),
    ])
});

/// Widths in em.
static SPACES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        (",", 0.16666),
        ("!", -0.16666),
        (">", 0.3),
        (":", 0.3),
        (";", 0.4),
        (" ", 0.5),
        ("quad", 1.0),
        ("qquad", 4.0),
    ])
});

/// Looks up a Greek letter command such as `alpha` or `Omega`.
pub fn greek_letter(name: &str) -> Option<char> {
    GREEK_LETTERS.get(name).copied()
}

/// Looks up the width of a spacing command such as `,` or `quad`.
pub fn space_width(name: &str) -> Option<f64> {
    SPACES.get(name).copied()
}
