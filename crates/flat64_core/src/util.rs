//! Small shared helpers.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two names in natural order: case-insensitive, with runs of
/// ASCII digits compared by numeric value instead of character by
/// character, so "disk2" sorts before "disk10".
///
/// Ties (names equal up to case) fall back to a case-sensitive compare
/// so the ordering is total and deterministic.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let da = take_digits(&mut ca);
                    let db = take_digits(&mut cb);
                    let va = da.trim_start_matches('0');
                    let vb = db.trim_start_matches('0');
                    let ord = va
                        .len()
                        .cmp(&vb.len())
                        .then_with(|| va.cmp(vb))
                        .then_with(|| da.len().cmp(&db.len()));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let xl = x.to_ascii_lowercase();
                    let yl = y.to_ascii_lowercase();
                    if xl != yl {
                        return xl.cmp(&yl);
                    }
                    ca.next();
                    cb.next();
                }
            }
        }
    }
}

/// Sort a list of names in natural order.
pub fn natural_sort(names: &mut [String]) {
    names.sort_by(|a, b| natural_cmp(a, b));
}

fn take_digits(chars: &mut Peekable<Chars>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}
