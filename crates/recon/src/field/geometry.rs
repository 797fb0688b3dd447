//! Box, point and polygon reconciliation.

use crate::flag::Flag;
use crate::note;

use super::{BoxCoords, Field, FieldValue, PointCoords};

/// Rounded mean. Ties go to the even neighbour, so 2.5 becomes 2.
pub(super) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        (sum / n as f64).round_ties_even()
    }
}

pub(super) fn reconcile_box(template: &Field, group: &[Option<&Field>], row_count: usize) -> Field {
    let boxes: Vec<&BoxCoords> = group
        .iter()
        .flatten()
        .filter_map(|f| match &f.value {
            FieldValue::Box(b) => Some(b),
            _ => None,
        })
        .collect();

    let value = BoxCoords {
        left: mean(boxes.iter().map(|b| b.left)),
        top: mean(boxes.iter().map(|b| b.top)),
        right: mean(boxes.iter().map(|b| b.right)),
        bottom: mean(boxes.iter().map(|b| b.bottom)),
    };
    let note = note::participation(boxes.len(), row_count, "box");
    Field::like(template, FieldValue::Box(value), note, Flag::Ok)
}

pub(super) fn reconcile_point(template: &Field, group: &[Option<&Field>], row_count: usize) -> Field {
    let points: Vec<&PointCoords> = group
        .iter()
        .flatten()
        .filter_map(|f| match &f.value {
            FieldValue::Point(p) => Some(p),
            _ => None,
        })
        .collect();

    let value = PointCoords {
        x: mean(points.iter().map(|p| p.x)),
        y: mean(points.iter().map(|p| p.y)),
    };
    let note = note::participation(points.len(), row_count, "point");
    Field::like(template, FieldValue::Point(value), note, Flag::Ok)
}

/// Polygons are not averaged: the first present record is kept as drawn.
pub(super) fn reconcile_polygon(
    template: &Field,
    group: &[Option<&Field>],
    row_count: usize,
) -> Field {
    let polygons: Vec<&Vec<PointCoords>> = group
        .iter()
        .flatten()
        .filter_map(|f| match &f.value {
            FieldValue::Polygon(points) => Some(points),
            _ => None,
        })
        .collect();

    let points = polygons.first().map(|p| (*p).clone()).unwrap_or_default();
    let note = note::participation(polygons.len(), row_count, "polygon");
    Field::like(template, FieldValue::Polygon(points), note, Flag::Ok)
}
