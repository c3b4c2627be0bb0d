//! Held-out evaluation: accuracy, confusion matrix, per-class report

use std::fmt;

use crate::dataset::N_CLASSES;

/// Rows are true classes, columns predicted classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub counts: [[usize; N_CLASSES]; N_CLASSES],
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[usize], predicted: &[usize]) -> Self {
        assert_eq!(truth.len(), predicted.len());
        let mut counts = [[0; N_CLASSES]; N_CLASSES];
        for (&t, &p) in truth.iter().zip(predicted) {
            counts[t][p] += 1;
        }
        Self { counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..N_CLASSES).map(|c| self.counts[c][c]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.counts {
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>5}")).collect();
            writeln!(f, "[{} ]", cells.join(""))?;
        }
        Ok(())
    }
}

/// Precision, recall, F1 and support of one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus macro and weighted averages
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn new(truth: &[usize], predicted: &[usize]) -> Self {
        let confusion = ConfusionMatrix::from_predictions(truth, predicted);
        let total = confusion.total();

        let classes: Vec<ClassMetrics> = (0..N_CLASSES)
            .map(|c| {
                let tp = confusion.counts[c][c];
                let predicted_c: usize = (0..N_CLASSES).map(|t| confusion.counts[t][c]).sum();
                let support: usize = confusion.counts[c].iter().sum();

                let precision = ratio(tp, predicted_c);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let n = classes.len() as f64;
        let macro_avg = ClassMetrics {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / n,
            support: total,
        };

        let weight = |m: &ClassMetrics| m.support as f64 / total.max(1) as f64;
        let weighted_avg = ClassMetrics {
            precision: classes.iter().map(|m| m.precision * weight(m)).sum(),
            recall: classes.iter().map(|m| m.recall * weight(m)).sum(),
            f1: classes.iter().map(|m| m.f1 * weight(m)).sum(),
            support: total,
        };

        Self {
            accuracy: confusion.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for (class, metrics) in self.classes.iter().enumerate() {
            write_row(f, &class.to_string(), metrics)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, label: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{label:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.precision, m.recall, m.f1, m.support
    )
}

/// Fraction of matching labels
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    ratio(correct, truth.len())
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUTH: [usize; 10] = [0, 0, 0, 0, 0, 0, 1, 1, 1, 1];
    const PRED: [usize; 10] = [0, 0, 0, 0, 0, 1, 1, 1, 0, 0];

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&TRUTH, &PRED), 0.7);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix() {
        let cm = ConfusionMatrix::from_predictions(&TRUTH, &PRED);
        assert_eq!(cm.counts, [[5, 1], [2, 2]]);
        assert_eq!(cm.total(), 10);
        assert_eq!(cm.accuracy(), 0.7);
    }

    #[test]
    fn test_report_values() {
        let report = ClassificationReport::new(&TRUTH, &PRED);

        let good = report.classes[0];
        assert!((good.precision - 5.0 / 7.0).abs() < 1e-12);
        assert!((good.recall - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(good.support, 6);

        let bad = report.classes[1];
        assert!((bad.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((bad.recall - 0.5).abs() < 1e-12);
        assert!((bad.f1 - 4.0 / 7.0).abs() < 1e-12);

        assert!((report.macro_avg.recall - (5.0 / 6.0 + 0.5) / 2.0).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let report = ClassificationReport::new(&[0, 0, 1], &[0, 0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn test_report_display() {
        let text = ClassificationReport::new(&TRUTH, &PRED).to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("0.70"));
    }
}
