use std::path::{Path, PathBuf};

use opencv::{
    core::{self, Mat, Scalar},
    dnn,
    prelude::*,
};
use sign_vision::core_modules::classifier::Classifier;
use sign_vision::pipeline::InputTensor;
use sign_vision::{Result, VisionError};

/// A classifier backed by OpenCV's DNN module.
pub struct DnnClassifier {
    net: dnn::Net,
    path: PathBuf,
}

impl DnnClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        let model_error = |reason: String| VisionError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(model_error("file not found".to_string()));
        }

        let net = dnn::read_net(&path.to_string_lossy(), "", "")
            .map_err(|e| model_error(e.to_string()))?;
        if net.empty().map_err(|e| model_error(e.to_string()))? {
            return Err(model_error("model has no layers".to_string()));
        }

        Ok(Self {
            net,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn inference_error(e: opencv::Error) -> VisionError {
    VisionError::Inference(e.to_string())
}

impl Classifier for DnnClassifier {
    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        let shape = input.shape();
        let element_count: usize = shape.iter().product();
        if input.data.len() != element_count {
            return Err(VisionError::Inference(format!(
                "tensor holds {} values but its shape {:?} needs {}",
                input.data.len(),
                shape,
                element_count
            )));
        }

        // NHWC, batch of one: the layout the network was exported with.
        let sizes = shape.map(|d| d as i32);
        let mut blob = Mat::new_nd_with_default(&sizes, core::CV_32F, Scalar::all(0.0))
            .map_err(inference_error)?;
        blob.data_typed_mut::<f32>()
            .map_err(inference_error)?
            .copy_from_slice(&input.data);

        self.net
            .set_input(&blob, "", 1.0, Scalar::default())
            .map_err(inference_error)?;
        let mut output = self.net.forward_single("").map_err(inference_error)?;
        if !output.is_continuous() {
            output = output.try_clone().map_err(inference_error)?;
        }

        let scores = output.data_typed::<f32>().map_err(inference_error)?.to_vec();
        Ok(scores)
    }
}
