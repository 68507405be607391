//! Unit tests for the demo's clear color animation

use super::*;

fn approx(a: [f32; 4], b: [f32; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn test_clear_color_starts_at_base() {
    let base = [0.1, 0.2, 0.3, 1.0];
    assert!(approx(animated_clear_color(base, 0.0), base));
}

#[test]
fn test_clear_color_reaches_inverse_at_half_period() {
    let base = [0.1, 0.2, 0.3, 1.0];
    let half_period = std::f32::consts::PI / 1.5;
    assert!(approx(animated_clear_color(base, half_period), [0.9, 0.8, 0.7, 1.0]));
}

#[test]
fn test_clear_color_keeps_alpha_and_range() {
    let base = [0.0, 0.5, 1.0, 0.75];
    for step in 0..50 {
        let color = animated_clear_color(base, step as f32 * 0.13);
        assert!((color[3] - 0.75).abs() < 1e-6);
        assert!(color.iter().all(|c| (0.0..=1.0).contains(c)));
    }
}

// ============================================================================
// ACQUIRE SEMAPHORE RECYCLING
// ============================================================================

#[test]
fn test_acquire_semaphores_need_spare() {
    assert!(AcquireSemaphores::<u64>::from_handles(Vec::new()).is_none());
    let semaphores = AcquireSemaphores::from_handles(vec![1u64, 2, 3]).unwrap();
    assert_eq!(semaphores.next(), 3);
}

#[test]
fn test_acquired_image_waits_on_semaphore_it_was_acquired_with() {
    let mut semaphores = AcquireSemaphores::from_handles(vec![10u64, 11, 99]).unwrap();

    let signaled = semaphores.next();
    assert_eq!(semaphores.acquired(1), signaled);
    // The semaphore image 1 held before becomes the spare
    assert_eq!(semaphores.next(), 11);
}

#[test]
fn test_out_of_order_acquires_free_only_the_acquired_images_semaphore() {
    // Images 0 and 1 come back out of order, as MAILBOX may return them
    let mut semaphores = AcquireSemaphores::from_handles(vec![10u64, 11, 99]).unwrap();
    let mut last_wait: [Option<u64>; 2] = [None, None];

    for index in [0usize, 0, 1, 0, 1, 1, 0] {
        let signaled = semaphores.next();
        let wait = semaphores.acquired(index);
        assert_eq!(wait, signaled);

        // The next acquire reuses what this image's previous submission
        // waited on; submit_fence for this image waits for that submission
        if let Some(previous) = last_wait[index] {
            assert_eq!(semaphores.next(), previous);
        }
        assert_ne!(semaphores.next(), wait);
        last_wait[index] = Some(wait);
    }
}

#[test]
fn test_into_handles_returns_every_semaphore_once() {
    let mut semaphores = AcquireSemaphores::from_handles(vec![1u64, 2, 3, 4]).unwrap();
    semaphores.acquired(2);
    semaphores.acquired(0);

    let mut handles: Vec<u64> = semaphores.into_handles().collect();
    handles.sort();
    assert_eq!(handles, vec![1, 2, 3, 4]);
}
