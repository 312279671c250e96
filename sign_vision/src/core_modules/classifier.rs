use crate::core_modules::frame::InputTensor;
use crate::error::Result;

/// A loaded model that maps one normalised image to a score per class.
pub trait Classifier {
    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        (**self).classify(input)
    }
}
