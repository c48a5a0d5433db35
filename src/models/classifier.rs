use crate::utils::error::FundusError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// 眼底图像分类器
///
/// 封装ONNX会话，输入为归一化的NHWC张量，输出为各类别的概率分布。
pub struct Classifier {
    session: Arc<Mutex<Session>>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
    num_classes: usize,
}

impl Classifier {
    pub fn new(config: &Config, num_classes: usize) -> Result<Self> {
        let model_path = config.model_path();

        if !model_path.exists() {
            return Err(FundusError::ModelLoad(
                format!("Classification model not found: {}", model_path.display())
            ));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(&model_path)?;

        // 动态发现输入输出名称
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| FundusError::ModelLoad(
                "Classification model has no inputs".to_string()
            ))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| FundusError::ModelLoad(
                "Classification model has no outputs".to_string()
            ))?;

        tracing::info!(
            "Classification model loaded: input='{}', output='{}'",
            input_name,
            output_name
        );

        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            num_classes,
        })
    }

    /// 单张图像推理，返回与类别目录对齐的概率向量
    pub fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        let predictions = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            // 使用动态发现的输出名称
            match outputs.get(&self.output_name) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(FundusError::Inference(format!(
                        "Classification output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        let shape = predictions.shape();
        if shape.len() != 2 {
            return Err(FundusError::Inference(format!(
                "Expected 2D classification tensor, got shape {:?}",
                shape
            )));
        }

        if shape[0] != 1 {
            return Err(FundusError::Inference(format!(
                "Expected batch size 1 for classification, got {}",
                shape[0]
            )));
        }

        if shape[1] != self.num_classes {
            return Err(FundusError::Inference(format!(
                "Model produced {} scores but catalog declares {} classes",
                shape[1], self.num_classes
            )));
        }

        // 取唯一的batch行
        Ok(predictions.iter().copied().collect())
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
