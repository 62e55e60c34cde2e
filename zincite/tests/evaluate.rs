use approx::assert_relative_eq;
use nalgebra::DMatrix;
use rand::{rngs::StdRng, Rng, SeedableRng};
use zincite::{Error, Field, FieldCache, Mesh};

/// Direct multilinear interpolation of corner values, bypassing the cache
fn multilinear(corners: &[f64], xi: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (c, &value) in corners.iter().enumerate() {
        let mut weight = 1.0;
        for (d, &x) in xi.iter().enumerate() {
            weight *= if c >> d & 1 == 1 { x } else { 1.0 - x };
        }
        sum += value * weight;
    }
    sum
}

#[test]
fn test_quadrature_sweep() {
    let mut mesh = Mesh::new();
    let element = mesh.create_element(2).unwrap();
    let mut field = Field::new("pressure", 1);
    let corners = [1.0, 4.0, -2.0, 3.0];
    field
        .define_on(element, DMatrix::from_row_slice(1, 4, &corners))
        .unwrap();

    let mut context = FieldCache::new();
    for i in 0..4 {
        for j in 0..4 {
            let xi = [0.125 + 0.25 * i as f64, 0.125 + 0.25 * j as f64];
            context.set_mesh_location(element, &xi).unwrap();
            let values = context.evaluate(&mesh, &field).unwrap();
            assert_relative_eq!(values[0], multilinear(&corners, &xi));
        }
    }
    // one element visited, one record held
    assert_eq!(context.values_cache("pressure").map(|c| c.len()), Some(1));
}

#[test]
fn test_derivatives_across_elements() {
    let mut mesh = Mesh::new();
    let left = mesh.create_element(2).unwrap();
    let right = mesh.create_element(2).unwrap();
    let mut field = Field::new("f", 1);
    // left: f = x + 2y; right: f = 3 - x
    field
        .define_on(left, DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 2.0, 3.0]))
        .unwrap();
    field
        .define_on(right, DMatrix::from_row_slice(1, 4, &[3.0, 2.0, 3.0, 2.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(left, &[0.3, 0.3]).unwrap();
    let d = context.evaluate_derivatives(&mesh, &field).unwrap();
    assert_relative_eq!(d[(0, 0)], 1.0);
    assert_relative_eq!(d[(0, 1)], 2.0);

    context.set_mesh_location(right, &[0.7, 0.1]).unwrap();
    let d = context.evaluate_derivatives(&mesh, &field).unwrap();
    assert_relative_eq!(d[(0, 0)], -1.0);
    assert_relative_eq!(d[(0, 1)], 0.0);

    assert_eq!(context.values_cache("f").map(|c| c.len()), Some(2));
}

#[test]
fn test_stale_until_notified() {
    let mut mesh = Mesh::new();
    let element = mesh.create_element(1).unwrap();
    let mut field = Field::new("f", 1);
    field
        .define_on(element, DMatrix::from_row_slice(1, 2, &[0.0, 2.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(element, &[0.5]).unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.0);

    // a silent mutation leaves the cached coefficients in use
    field
        .set_parameters(element, 0, DMatrix::from_row_slice(1, 2, &[10.0, 12.0]))
        .unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.0);

    // the change notification invalidates them
    context.field_changed("f");
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 11.0);
}

#[test]
fn test_unsettled_changes_bypass_cache() {
    let mut mesh = Mesh::new();
    let element = mesh.create_element(1).unwrap();
    let mut field = Field::new("f", 1);
    field
        .define_on(element, DMatrix::from_row_slice(1, 2, &[0.0, 2.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(element, &[0.5]).unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.0);

    // inside an open change batch, every request recomputes
    field.begin_change();
    field
        .set_parameters(element, 0, DMatrix::from_row_slice(1, 2, &[4.0, 6.0]))
        .unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 5.0);
    field
        .set_parameters(element, 0, DMatrix::from_row_slice(1, 2, &[8.0, 10.0]))
        .unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 9.0);
    field.end_change();
    context.field_changed("f");
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 9.0);
}

#[test]
fn test_mesh_change_invalidates() {
    let mut mesh = Mesh::new();
    let a = mesh.create_element(1).unwrap();
    let b = mesh.create_element(1).unwrap();
    let mut field = Field::new("f", 1);
    field
        .define_on(a, DMatrix::from_row_slice(1, 2, &[0.0, 1.0]))
        .unwrap();
    field
        .define_on(b, DMatrix::from_row_slice(1, 2, &[5.0, 6.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(a, &[0.0]).unwrap();
    context.evaluate(&mesh, &field).unwrap();
    context.set_mesh_location(b, &[0.0]).unwrap();
    context.evaluate(&mesh, &field).unwrap();

    mesh.destroy_element(a).unwrap();
    context.mesh_changed();
    assert_eq!(context.values_cache("f").map(|c| c.len()), Some(0));

    // the destroyed element now fails cleanly; the survivor still evaluates
    context.set_mesh_location(a, &[0.0]).unwrap();
    assert!(matches!(
        context.evaluate(&mesh, &field),
        Err(Error::UnknownElement(_))
    ));
    context.set_mesh_location(b, &[0.0]).unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 5.0);
}

#[test]
fn test_static_field_ignores_time() {
    let mut mesh = Mesh::new();
    let element = mesh.create_element(1).unwrap();
    let mut field = Field::new("f", 1);
    field
        .define_on(element, DMatrix::from_row_slice(1, 2, &[0.0, 2.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(element, &[0.5]).unwrap();
    context.set_time(0.0);
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.0);

    // a silent mutation makes cache reuse observable: if the time sweep
    // missed the cache, the new parameters would show through
    field
        .set_parameters(element, 0, DMatrix::from_row_slice(1, 2, &[100.0, 102.0]))
        .unwrap();
    for step in 1..5 {
        context.set_time(step as f64);
        assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.0);
    }
}

#[test]
fn test_time_dependent_field_tracks_time() {
    let mut mesh = Mesh::new();
    let element = mesh.create_element(1).unwrap();
    let mut field = Field::with_times("f", 1, vec![0.0, 1.0]).unwrap();
    field
        .define_on_with_steps(
            element,
            vec![
                DMatrix::from_row_slice(1, 2, &[0.0, 0.0]),
                DMatrix::from_row_slice(1, 2, &[8.0, 8.0]),
            ],
        )
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(element, &[0.5]).unwrap();
    for (time, expected) in [(0.0, 0.0), (0.25, 2.0), (1.0, 8.0), (0.25, 2.0)] {
        context.set_time(time);
        assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], expected);
    }
}

#[test]
fn test_basis_derivatives() {
    let mut mesh = Mesh::new();
    let element = mesh.create_element(2).unwrap();
    let mut field = Field::new("f", 1);
    // f = x + 2y exactly (the xy term cancels)
    field
        .define_on(element, DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 2.0, 3.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(element, &[0.4, 0.9]).unwrap();
    let dx = context
        .evaluate_basis_derivative(&mesh, &field, &[0])
        .unwrap();
    assert_relative_eq!(dx[0], 1.0);
    let dy = context
        .evaluate_basis_derivative(&mesh, &field, &[1])
        .unwrap();
    assert_relative_eq!(dy[0], 2.0);

    // alternating requests never contaminate each other, and plain values
    // still come out right afterwards
    let dx_again = context
        .evaluate_basis_derivative(&mesh, &field, &[0])
        .unwrap();
    assert_relative_eq!(dx_again[0], 1.0);
    let dxx = context
        .evaluate_basis_derivative(&mesh, &field, &[0, 0])
        .unwrap();
    assert_relative_eq!(dxx[0], 0.0);
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 2.2);
}

#[test]
fn test_face_inherits_top_level_context() {
    let mut mesh = Mesh::new();
    let volume = mesh.create_element(3).unwrap();
    let face = mesh.create_child(volume, 2).unwrap();
    let mut field = Field::new("f", 1);
    field
        .define_on(face, DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 2.0, 3.0]))
        .unwrap();

    let mut context = FieldCache::new();
    context.set_mesh_location(face, &[0.5, 0.5]).unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.5);

    // an explicit top-level override is part of the request identity
    context
        .set_mesh_location_with_top_level(face, &[0.5, 0.5], face)
        .unwrap();
    assert_relative_eq!(context.evaluate(&mesh, &field).unwrap()[0], 1.5);
}

#[test]
fn test_no_location() {
    let mut mesh = Mesh::new();
    mesh.create_element(1).unwrap();
    let field = Field::new("f", 1);
    let mut context = FieldCache::new();
    assert!(matches!(
        context.evaluate(&mesh, &field),
        Err(Error::NoLocation)
    ));
}

#[test]
fn test_randomized_against_direct_interpolation() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut mesh = Mesh::new();
    let mut field = Field::new("f", 2);
    let mut elements = Vec::new();
    let mut corner_sets = Vec::new();
    for _ in 0..20 {
        let element = mesh.create_element(3).unwrap();
        let corners: Vec<f64> = (0..16).map(|_| rng.gen_range(-10.0..10.0)).collect();
        field
            .define_on(element, DMatrix::from_row_slice(2, 8, &corners))
            .unwrap();
        elements.push(element);
        corner_sets.push(corners);
    }

    let mut context = FieldCache::new();
    for _ in 0..200 {
        let pick = rng.gen_range(0..elements.len());
        let xi = [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()];
        context.set_mesh_location(elements[pick], &xi).unwrap();
        let values = context.evaluate(&mesh, &field).unwrap();
        for component in 0..2 {
            let corners = &corner_sets[pick][component * 8..(component + 1) * 8];
            assert_relative_eq!(values[component], multilinear(corners, &xi), epsilon = 1e-9);
        }
    }
}
