use std::cmp::Ordering;

/// Numeric-aware string ordering: runs of ASCII digits compare by value, so
/// `checkpoint_epoch_10` sorts after `checkpoint_epoch_9`.
///
/// Equal-valued digit runs with different zero padding ("07" vs "7") fall
/// back to plain byte order so the ordering stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut x, mut y) = (a.as_bytes(), b.as_bytes());

    loop {
        match (x.first(), y.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(cx), Some(cy)) if cx.is_ascii_digit() && cy.is_ascii_digit() => {
                let (dx, rest_x) = split_digits(x);
                let (dy, rest_y) = split_digits(y);
                let ord = cmp_digit_runs(dx, dy);
                if ord != Ordering::Equal {
                    return ord;
                }
                x = rest_x;
                y = rest_y;
            }
            (Some(cx), Some(cy)) => {
                let ord = cx.cmp(cy);
                if ord != Ordering::Equal {
                    return ord;
                }
                x = &x[1..];
                y = &y[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Compares two digit runs by numeric value without parsing, so arbitrarily
/// long runs cannot overflow.
fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().position(|&c| c != b'0').unwrap_or(s.len()) };
    let (a, b) = (&a[trim(a)..], &b[trim(b)..]);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        let mut names = vec![
            "checkpoint_epoch_100.json",
            "checkpoint_epoch_5.json",
            "checkpoint_epoch_10.json",
            "checkpoint_epoch_0.json",
        ];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec![
            "checkpoint_epoch_0.json",
            "checkpoint_epoch_5.json",
            "checkpoint_epoch_10.json",
            "checkpoint_epoch_100.json",
        ]);
    }

    #[test]
    fn text_and_padding() {
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("b1", "a9"), Ordering::Greater);
        assert_eq!(natural_cmp("x", "x1"), Ordering::Less);
        assert_ne!(natural_cmp("run_007", "run_7"), Ordering::Equal);
        assert_eq!(natural_cmp("99999999999999999999999", "100000000000000000000000"), Ordering::Less);
    }
}
