/// Parse a NumPy `.npy` array file into a flat `f64` buffer plus its shape,
/// ready to be cut into signal windows.
///
/// # File layout
/// ```text
/// bytes 0-5:   0x93 'N' 'U' 'M' 'P' 'Y'   (magic)
/// byte  6:     major version (1, 2 or 3)
/// byte  7:     minor version
/// v1:          bytes 8-9   header length, little-endian u16
/// v2/v3:       bytes 8-11  header length, little-endian u32
/// header:      Python dict literal, e.g.
///              {'descr': '<f4', 'fortran_order': False, 'shape': (100, 1, 60), }
/// payload:     product(shape) elements of `descr`, C order
/// ```
///
/// Supported dtypes: `<f4`, `<f8`, `<i4`, `<i8` (`|` and `=` byte-order
/// markers are accepted for the same types on little-endian data).

const MAGIC: &[u8] = b"\x93NUMPY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F4,
    F8,
    I4,
    I8,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Dtype, String> {
        let mut chars = descr.chars();
        match chars.next() {
            Some('<' | '|' | '=') => {}
            Some('>') => return Err(format!("big-endian dtype '{descr}' is not supported.")),
            _ => return Err(format!("dtype '{descr}' has no byte-order marker.")),
        }
        match chars.as_str() {
            "f4" => Ok(Dtype::F4),
            "f8" => Ok(Dtype::F8),
            "i4" => Ok(Dtype::I4),
            "i8" => Ok(Dtype::I8),
            _ => Err(format!("unsupported dtype '{descr}'; expected f4, f8, i4 or i8.")),
        }
    }

    fn width(self) -> usize {
        match self {
            Dtype::F4 | Dtype::I4 => 4,
            Dtype::F8 | Dtype::I8 => 8,
        }
    }

    fn decode(self, b: &[u8]) -> f64 {
        match self {
            Dtype::F4 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            Dtype::F8 => f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            Dtype::I4 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            Dtype::I8 => i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64,
        }
    }
}

/// A decoded array: `data.len() == shape.iter().product()`.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

pub fn parse_npy(bytes: &[u8]) -> Result<NpyArray, String> {
    // ── Preamble ────────────────────────────────────────────────────────────

    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err("not an .npy file: missing \\x93NUMPY magic.".to_owned());
    }

    let major = bytes[6];
    let (header_len, header_start): (usize, usize) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("file too short for a version 2 header.".to_owned());
            }
            (u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, 12)
        }
        v => return Err(format!("unsupported .npy format version {v}.")),
    };

    let header_end = header_start
        .checked_add(header_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| format!(
            "header declares {header_len} bytes but the file is only {} bytes.",
            bytes.len()
        ))?;
    let header = std::str::from_utf8(&bytes[header_start..header_end])
        .map_err(|_| "header is not valid UTF-8.".to_owned())?;

    // ── Header dict ─────────────────────────────────────────────────────────

    let dtype = Dtype::parse(&quoted_value(header, "descr")?)?;
    if raw_value(header, "fortran_order")?.starts_with("True") {
        return Err("Fortran-ordered arrays are not supported.".to_owned());
    }
    let shape = parse_shape(raw_value(header, "shape")?)?;
    if shape.is_empty() {
        return Err("0-d arrays carry no samples.".to_owned());
    }

    // ── Payload ─────────────────────────────────────────────────────────────

    let count = shape.iter()
        .try_fold(1_usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| format!("shape {shape:?} overflows usize."))?;
    let needed = count
        .checked_mul(dtype.width())
        .ok_or_else(|| format!("shape {shape:?} overflows usize."))?;
    let payload = &bytes[header_end..];
    if payload.len() < needed {
        return Err(format!(
            "payload too short: shape {:?} needs {} bytes, found {}.",
            shape, needed, payload.len()
        ));
    }

    let data = payload[..needed]
        .chunks_exact(dtype.width())
        .map(|b| dtype.decode(b))
        .collect();

    Ok(NpyArray { shape, data })
}

/// Encodes a little-endian `f8` C-order `.npy` (version 1.0) file.
pub fn encode_npy(shape: &[usize], data: &[f64]) -> Vec<u8> {
    let dims = match shape {
        [single] => format!("{single},"),
        _ => shape.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", "),
    };
    let mut header = format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({dims}), }}");
    // Pad so the payload starts on a 64-byte boundary; the header ends in '\n'.
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + data.len() * 8);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for x in data {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

/// Text following `'key':` up to the end of the header, leading space trimmed.
fn raw_value<'h>(header: &'h str, key: &str) -> Result<&'h str, String> {
    for quote in ['\'', '"'] {
        let needle = format!("{quote}{key}{quote}");
        if let Some(pos) = header.find(&needle) {
            let rest = &header[pos + needle.len()..];
            let rest = rest.trim_start().strip_prefix(':')
                .ok_or_else(|| format!("header key '{key}' is not followed by ':'."))?;
            return Ok(rest.trim_start());
        }
    }
    Err(format!("header has no '{key}' entry."))
}

fn quoted_value(header: &str, key: &str) -> Result<String, String> {
    let rest = raw_value(header, key)?;
    let quote = rest.chars().next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| format!("header value for '{key}' is not a string."))?;
    let body = &rest[1..];
    let end = body.find(quote)
        .ok_or_else(|| format!("unterminated string for '{key}'."))?;
    Ok(body[..end].to_owned())
}

fn parse_shape(rest: &str) -> Result<Vec<usize>, String> {
    let inner = rest.strip_prefix('(')
        .and_then(|r| r.split_once(')'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| "header 'shape' is not a tuple.".to_owned())?;
    inner.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('L').parse::<usize>()
            .map_err(|_| format!("bad dimension '{s}' in shape.")))
        .collect()
}
