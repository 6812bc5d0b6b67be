use crate::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

pub trait BBoxFormat: fmt::Debug + Copy {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f64; 4], PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [f64; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f64; 4] {
        &self.0
    }

    // Use carefully when you REALLY sure that slice have needed format
    #[inline(always)]
    pub fn assigned(slice: &[f64; 4]) -> Self {
        BBox(*slice, Default::default())
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(x1: f64, x2: f64, x3: f64, x4: f64) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> f64 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> f64 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f64, x2: f64, x3: f64, x4: f64) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f64 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f64 {
        self.0[3]
    }

    #[inline(always)]
    pub fn width(&self) -> f64 {
        self.0[2] - self.0[0]
    }

    #[inline(always)]
    pub fn height(&self) -> f64 {
        self.0[3] - self.0[1]
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.0[0] + self.0[2]) / 2.0
    }

    /// Zero or negative extent along either axis.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Strict containment of `inner`, edges excluded.
    pub fn contains(&self, inner: &BBox<Ltrb>) -> bool {
        inner.left() > self.left()
            && inner.top() > self.top()
            && inner.right() < self.right()
            && inner.bottom() < self.bottom()
    }

    /// Linear interpolation toward `other`, `t` in `[0, 1]`, each coordinate independently.
    pub fn interpolate(&self, other: &BBox<Ltrb>, t: f64) -> BBox<Ltrb> {
        let mut out = [0.0; 4];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.0[i] + t * (other.0[i] - self.0[i]);
        }

        BBox::assigned(&out)
    }

    /// Parses the printed-array form written by the perception stage.
    ///
    /// Accepts `[x1 y1 x2 y2]` with arbitrary inner whitespace, the comma
    /// separated list form and the bare form without brackets.
    pub fn parse_legacy(s: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedBox {
            value: s.to_string(),
        };

        let mut body = s.trim();
        if let Some(rest) = body.strip_prefix('[') {
            body = rest.strip_suffix(']').ok_or_else(malformed)?;
        }

        let mut out = [0.0; 4];
        let mut count = 0;

        for token in body
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            if count == 4 {
                return Err(malformed());
            }

            let value: f64 = token.parse().map_err(|_| malformed())?;
            if !value.is_finite() {
                return Err(malformed());
            }

            out[count] = value;
            count += 1;
        }

        if count != 4 {
            return Err(malformed());
        }

        Ok(BBox::assigned(&out))
    }

    #[inline]
    pub fn to_legacy_string(&self) -> String {
        self.to_string()
    }
}

impl FromStr for BBox<Ltrb> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BBox::parse_legacy(s)
    }
}

impl fmt::Display for BBox<Ltrb> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {} {}]", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] + v.0[0], v.0[3] + v.0[1]],
            Default::default(),
        )
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self(
            [v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1]],
            Default::default(),
        )
    }
}
