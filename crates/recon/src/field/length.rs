//! Line-length reconciliation with scale and ruler calibration.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::flag::Flag;
use crate::note;

use super::geometry::mean;
use super::{round2, Field, FieldValue, LengthLine};

static SCALE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bscale\s+([0-9.]+)\s*(mm|cm|dm|m)\b").unwrap());
static RULER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*([0-9.]+)\s*(mm|cm|dm|m)\b").unwrap());

/// A real-world length, or a units-per-pixel factor on ruler lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub value: f64,
    pub units: String,
}

/// Number and unit read from a length column's name.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthScale {
    pub factor: f64,
    pub units: String,
}

impl LengthScale {
    /// `"stem scale 0.5 mm"` → 0.5 mm per pixel.
    pub fn from_scale_name(name: &str) -> Option<Self> {
        Self::capture(&SCALE, name)
    }

    /// `"10 cm"` names a ruler drawn over a 10 cm bar.
    pub fn from_ruler_name(name: &str) -> Option<Self> {
        if SCALE.is_match(name) {
            return None;
        }
        Self::capture(&RULER, name)
    }

    fn capture(re: &Regex, name: &str) -> Option<Self> {
        let caps = re.captures(name)?;
        let factor: f64 = caps[1].parse().ok()?;
        Some(Self { factor, units: caps[2].to_lowercase() })
    }
}

pub(super) fn reconcile(template: &Field, group: &[Option<&Field>], row_count: usize) -> Field {
    let lines: Vec<&LengthLine> = group
        .iter()
        .flatten()
        .filter_map(|f| match &f.value {
            FieldValue::Length(line) => Some(line),
            _ => None,
        })
        .collect();

    let mut line = LengthLine {
        x1: mean(lines.iter().map(|l| l.x1)),
        y1: mean(lines.iter().map(|l| l.y1)),
        x2: mean(lines.iter().map(|l| l.x2)),
        y2: mean(lines.iter().map(|l| l.y2)),
        ..LengthLine::default()
    };
    line.pixel_length = round2((line.x2 - line.x1).hypot(line.y2 - line.y1));

    if let Some(scale) = LengthScale::from_scale_name(&template.name_group) {
        line.calibration = Some(Calibration {
            value: round2(line.pixel_length * scale.factor),
            units: scale.units,
        });
    } else if let Some(ruler) = LengthScale::from_ruler_name(&template.name_group) {
        if line.pixel_length > 0.0 {
            line.ruler = Some(Calibration {
                value: ruler.factor / line.pixel_length,
                units: ruler.units,
            });
        } else {
            log::warn!("ruler '{}' has zero length; ignoring it", template.field_name());
        }
    }

    let note = note::participation(lines.len(), row_count, "length");
    Field::like(template, FieldValue::Length(line), note, Flag::Ok)
}

/// Give uncalibrated lengths in a reconciled row the units of the row's
/// first ruler.
pub(super) fn calibrate_with_ruler(fields: &mut [Field]) {
    let ruler = fields.iter().find_map(|f| match &f.value {
        FieldValue::Length(LengthLine { ruler: Some(r), .. }) => Some(r.clone()),
        _ => None,
    });
    let Some(ruler) = ruler else { return };

    for field in fields.iter_mut() {
        if let FieldValue::Length(line) = &mut field.value {
            if line.ruler.is_none() && line.calibration.is_none() {
                line.calibration = Some(Calibration {
                    value: round2(line.pixel_length * ruler.value),
                    units: ruler.units.clone(),
                });
                log::debug!("calibrated '{}' from ruler", field.name_group);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> Field {
        Field::new(name, FieldValue::Length(LengthLine { x1, y1, x2, y2, ..Default::default() }))
    }

    fn payload(field: &Field) -> &LengthLine {
        match &field.value {
            FieldValue::Length(l) => l,
            other => panic!("not a length: {other:?}"),
        }
    }

    #[test]
    fn scale_names() {
        assert_eq!(
            LengthScale::from_scale_name("Leaf scale 0.5 mm"),
            Some(LengthScale { factor: 0.5, units: "mm".into() })
        );
        assert_eq!(
            LengthScale::from_scale_name("SCALE 2CM"),
            Some(LengthScale { factor: 2.0, units: "cm".into() })
        );
        assert_eq!(LengthScale::from_scale_name("leaf length"), None);
        assert_eq!(LengthScale::from_scale_name("scale 1.2.3 mm"), None);
        assert_eq!(LengthScale::from_ruler_name("scale 1 mm"), None);
        assert_eq!(
            LengthScale::from_ruler_name("10 cm ruler"),
            Some(LengthScale { factor: 10.0, units: "cm".into() })
        );
    }

    #[test]
    fn endpoints_average_then_measure() {
        let a = line("leaf scale 0.5 mm", 0.0, 0.0, 10.0, 0.0);
        let b = line("leaf scale 0.5 mm", 0.0, 0.0, 8.0, 0.0);
        let out = reconcile(&a, &[Some(&a), Some(&b)], 2);
        let l = payload(&out);
        assert_eq!((l.x1, l.y1, l.x2, l.y2), (0.0, 0.0, 9.0, 0.0));
        assert_eq!(l.pixel_length, 9.0);
        assert_eq!(l.calibration, Some(Calibration { value: 4.5, units: "mm".into() }));
        assert_eq!(out.note, "There are 2 of 2 length records");
    }

    #[test]
    fn endpoint_ties_round_to_even() {
        let a = line("stem", 0.0, 1.0, 5.0, 0.0);
        let b = line("stem", 0.0, 2.0, 6.0, 0.0);
        let out = reconcile(&a, &[Some(&a), Some(&b)], 2);
        let l = payload(&out);
        assert_eq!((l.x1, l.y1, l.x2, l.y2), (0.0, 2.0, 6.0, 0.0));
        assert_eq!(l.pixel_length, 6.32);
    }

    #[test]
    fn pixel_length_rounds_to_two_places() {
        let a = line("diagonal", 0.0, 0.0, 1.0, 1.0);
        let out = reconcile(&a, &[Some(&a)], 1);
        assert_eq!(payload(&out).pixel_length, 1.41);
        assert_eq!(payload(&out).calibration, None);
    }

    #[test]
    fn ruler_calibrates_other_lengths() {
        let ruler = line("10 mm", 0.0, 0.0, 20.0, 0.0);
        let stem = line("stem", 0.0, 0.0, 0.0, 7.0);
        let scaled = line("leaf scale 2 cm", 0.0, 0.0, 3.0, 4.0);

        let mut row = vec![
            reconcile(&stem, &[Some(&stem)], 1),
            reconcile(&ruler, &[Some(&ruler)], 1),
            reconcile(&scaled, &[Some(&scaled)], 1),
        ];
        calibrate_with_ruler(&mut row);

        assert_eq!(
            payload(&row[0]).calibration,
            Some(Calibration { value: 3.5, units: "mm".into() })
        );
        assert_eq!(payload(&row[1]).calibration, None);
        assert_eq!(
            payload(&row[2]).calibration,
            Some(Calibration { value: 10.0, units: "cm".into() })
        );
    }

    #[test]
    fn zero_length_ruler_is_ignored() {
        let ruler = line("5 cm", 3.0, 3.0, 3.0, 3.0);
        let stem = line("stem", 0.0, 0.0, 0.0, 7.0);
        let mut row = vec![
            reconcile(&ruler, &[Some(&ruler)], 1),
            reconcile(&stem, &[Some(&stem)], 1),
        ];
        calibrate_with_ruler(&mut row);
        assert_eq!(payload(&row[1]).calibration, None);
    }
}
