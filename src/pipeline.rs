//! Canvas to prediction: downsample, normalize, reshape, classify.

use digits_helpers::IMAGE_SIDE;
use image::imageops::{self, FilterType};
use ndarray::{Array2, Array4, Axis};

use crate::canvas::Canvas;
use crate::classifier::{Classifier, Prediction};
use crate::error::PipelineError;

/// Resamples the canvas to 28×28 with bicubic interpolation.
pub fn downsample(canvas: &Canvas) -> Array2<u8> {
    let side = IMAGE_SIDE as u32;
    let small = imageops::resize(canvas.image(), side, side, FilterType::CatmullRom);
    // `resize` always yields exactly side * side luma samples.
    Array2::from_shape_fn((IMAGE_SIDE, IMAGE_SIDE), |(y, x)| {
        small.get_pixel(x as u32, y as u32)[0]
    })
}

/// Maps intensities to `[0, 1]`.
pub fn normalize(pixels: &Array2<u8>) -> Array2<f32> {
    pixels.mapv(|p| f32::from(p) / 255.0)
}

/// Adds the batch and channel axes: `[28, 28]` becomes `[1, 28, 28, 1]`.
pub fn to_model_input(image: Array2<f32>) -> Array4<f32> {
    image.insert_axis(Axis(0)).insert_axis(Axis(3))
}

/// The full preprocessing chain applied before classification.
pub fn preprocess(canvas: &Canvas) -> Array4<f32> {
    to_model_input(normalize(&downsample(canvas)))
}

/// Classifies whatever is currently drawn on `canvas`.
///
/// A blank canvas is classified like any other; the result is simply
/// whatever the model makes of an empty image.
pub fn predict(classifier: &dyn Classifier, canvas: &Canvas) -> Result<Prediction, PipelineError> {
    let input = preprocess(canvas);
    let probabilities = classifier.predict_batch(input.view())?;
    if probabilities.nrows() != 1 {
        return Err(PipelineError::OutputShape {
            expected: 1,
            actual: probabilities.nrows(),
        });
    }
    let row = probabilities.row(0).to_vec();
    let prediction = Prediction::from_slice(&row)?;
    log::debug!(
        "{} predicted {} ({:.1}%)",
        classifier.name(),
        prediction.digit(),
        prediction.confidence() * 100.0
    );
    Ok(prediction)
}
