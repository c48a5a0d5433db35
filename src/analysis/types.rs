use crate::models::ClassCatalog;
use crate::utils::error::FundusError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// 诊断建议级别
///
/// normal为提示级，cataract为警示级，其余类别一律为紧急级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Informational,
    Cautionary,
    Urgent,
}

impl Severity {
    /// 按类别名称映射建议级别
    pub fn for_class(class_name: &str) -> Self {
        match class_name {
            "normal" => Severity::Informational,
            "cataract" => Severity::Cautionary,
            _ => Severity::Urgent,
        }
    }

    /// 结果卡片的样式类名
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Informational => "result-good",
            Severity::Cautionary => "result-warning",
            Severity::Urgent => "result-danger",
        }
    }

    /// 固定的建议文案
    pub fn advice(&self) -> &'static str {
        match self {
            Severity::Informational => {
                "No significant retinal abnormalities detected. \
                 Routine eye check-ups are recommended."
            }
            Severity::Cautionary => {
                "Cataract-related visual patterns detected. \
                 Early consultation with an ophthalmologist is advised."
            }
            Severity::Urgent => {
                "Patterns associated with serious retinal conditions detected. \
                 Immediate medical consultation is strongly recommended."
            }
        }
    }
}

/// 单个类别的置信度（百分比）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassProbability {
    /// 类别原始名称
    pub class: String,
    /// 展示名称
    pub display_name: String,
    /// 置信度百分比 (0.0 - 100.0)
    pub percent: f32,
}

/// 模型信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// 模型架构名称
    pub model_name: String,
    /// 模型在测试集上的准确率（百分比）
    pub test_accuracy: f32,
}

/// 完整的分析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 最高置信度类别的原始名称
    pub condition: String,
    /// 最高置信度类别的展示名称
    pub display_name: String,
    /// 最高类别的置信度百分比
    pub confidence: f32,
    /// 建议级别
    pub severity: Severity,
    /// 建议文案
    pub advice: String,
    /// 结果卡片样式类名
    pub style_class: String,
    /// 全部类别的置信度，与类别目录顺序一致
    pub probabilities: Vec<ClassProbability>,
    /// 处理耗时（秒）
    pub processing_time: f32,
    /// 模型信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

impl AnalysisResult {
    /// 由概率向量构建分析结果
    ///
    /// 概率向量必须与类别目录长度一致；并列最大值时取最小索引。
    pub fn from_probabilities(
        catalog: &ClassCatalog,
        probabilities: &[f32],
        processing_time: f32,
    ) -> Result<Self> {
        if probabilities.len() != catalog.len() {
            return Err(FundusError::Inference(format!(
                "Probability vector has {} entries but catalog has {} classes",
                probabilities.len(),
                catalog.len()
            )));
        }

        // argmax，严格大于保证并列时最小索引胜出
        let mut top_index = 0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > probabilities[top_index] {
                top_index = i;
            }
        }

        let condition = catalog
            .class_name(top_index)
            .ok_or_else(|| FundusError::Internal("Catalog index out of range".to_string()))?
            .to_string();

        let severity = Severity::for_class(&condition);

        let class_probabilities = catalog
            .class_names()
            .iter()
            .zip(probabilities.iter())
            .map(|(name, &p)| ClassProbability {
                class: name.clone(),
                display_name: ClassCatalog::display_name(name),
                percent: p * 100.0,
            })
            .collect();

        Ok(Self {
            display_name: ClassCatalog::display_name(&condition),
            confidence: probabilities[top_index] * 100.0,
            severity,
            advice: severity.advice().to_string(),
            style_class: severity.css_class().to_string(),
            condition,
            probabilities: class_probabilities,
            processing_time,
            model_info: None,
        })
    }

    pub fn with_model_info(mut self, model_info: ModelInfo) -> Self {
        self.model_info = Some(model_info);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempdir::TempDir;

    fn catalog() -> ClassCatalog {
        let dir = TempDir::new("types").unwrap();
        let path = dir.path().join("class_mapping.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(
            br#"{
                "classes": ["cataract", "diabetic_retinopathy", "glaucoma", "normal"],
                "model_name": "EfficientNetB3",
                "test_accuracy": 94.37
            }"#,
        )
        .unwrap();
        ClassCatalog::load(&path).unwrap()
    }

    #[test]
    fn cataract_scenario() {
        let result =
            AnalysisResult::from_probabilities(&catalog(), &[0.7, 0.1, 0.1, 0.1], 0.05).unwrap();

        assert_eq!(result.condition, "cataract");
        assert_eq!(result.display_name, "Cataract");
        assert_relative_eq!(result.confidence, 70.0, epsilon = 1e-4);
        assert_eq!(format!("{:.2}%", result.confidence), "70.00%");
        assert_eq!(result.severity, Severity::Cautionary);
        assert_eq!(result.style_class, "result-warning");
        assert!(result.advice.starts_with("Cataract-related"));
    }

    #[test]
    fn normal_is_informational_at_any_confidence() {
        for probs in [[0.1, 0.2, 0.2, 0.5], [0.24, 0.25, 0.25, 0.26]] {
            let result = AnalysisResult::from_probabilities(&catalog(), &probs, 0.0).unwrap();

            assert_eq!(result.condition, "normal");
            assert_eq!(result.severity, Severity::Informational);
            assert_eq!(result.style_class, "result-good");
            assert!(result.advice.contains("No significant retinal abnormalities"));
        }
    }

    #[test]
    fn urgent_classes_share_advisory() {
        let dr =
            AnalysisResult::from_probabilities(&catalog(), &[0.1, 0.6, 0.2, 0.1], 0.0).unwrap();
        let glaucoma =
            AnalysisResult::from_probabilities(&catalog(), &[0.1, 0.2, 0.6, 0.1], 0.0).unwrap();

        assert_eq!(dr.severity, Severity::Urgent);
        assert_eq!(glaucoma.severity, Severity::Urgent);
        assert_eq!(dr.advice, glaucoma.advice);
        assert_eq!(dr.display_name, "Diabetic Retinopathy");
    }

    #[test]
    fn uniform_distribution_selects_first_class() {
        let result =
            AnalysisResult::from_probabilities(&catalog(), &[0.25, 0.25, 0.25, 0.25], 0.0)
                .unwrap();

        assert_eq!(result.condition, "cataract");
        assert_relative_eq!(result.confidence, 25.0, epsilon = 1e-4);
    }

    #[test]
    fn percentages_align_with_catalog_and_sum_to_hundred() {
        let result =
            AnalysisResult::from_probabilities(&catalog(), &[0.7, 0.1, 0.1, 0.1], 0.0).unwrap();

        assert_eq!(result.probabilities.len(), 4);
        assert_eq!(result.probabilities[0].class, "cataract");
        assert_eq!(result.probabilities[3].class, "normal");

        let sum: f32 = result.probabilities.iter().map(|p| p.percent).sum();
        assert_relative_eq!(sum, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err =
            AnalysisResult::from_probabilities(&catalog(), &[0.5, 0.5], 0.0).unwrap_err();
        assert!(matches!(err, FundusError::Inference(_)));
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(Severity::for_class("normal"), Severity::Informational);
        assert_eq!(Severity::for_class("cataract"), Severity::Cautionary);
        assert_eq!(Severity::for_class("glaucoma"), Severity::Urgent);
        assert_eq!(Severity::for_class("diabetic_retinopathy"), Severity::Urgent);
    }
}
