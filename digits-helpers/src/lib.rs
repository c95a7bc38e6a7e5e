use ndarray::{NdFloat, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

mod activation;
mod common;

pub use activation::{argmax, relu, relu_grad_mask, softmax_rows};
pub use common::{DataPoint, normalize_pixels};

/// Side length of the square images the classifier consumes.
pub const IMAGE_SIDE: usize = 28;

/// Number of pixels in one flattened input image.
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;

/// Number of digit classes (0 through 9).
pub const NUM_CLASSES: usize = 10;

pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }

    /// Lossy conversion from an `f64` constant. Every `Float` can represent
    /// (an approximation of) any finite `f64`, so this never fails for them.
    fn from_f64_lossy(x: f64) -> Self {
        <Self as FromPrimitive>::from_f64(x).unwrap_or_else(Self::zero)
    }
}

impl Float for f32 {}

impl Float for f64 {}
