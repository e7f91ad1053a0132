//! Property tests for alignment, size models and workspace monotonicity.

use kws_foundation::{
    BlockBuffering, Capabilities, ClassLayout, ClassLayouts, Configuration, HeapGeometry, ObjectClass,
    ReservationRule, SizeModel, StackConfig, TargetProfile, align_up, elaborate,
};
use proptest::prelude::*;

fn any_class() -> impl Strategy<Value = ObjectClass> {
    (0..ObjectClass::COUNT).prop_map(|index| ObjectClass::ALL[index])
}

fn any_preset() -> impl Strategy<Value = TargetProfile> {
    prop::sample::select(kws_foundation::PRESET_NAMES.to_vec())
        .prop_map(|name| TargetProfile::preset(name).unwrap())
}

proptest! {
    #[test]
    fn align_rounds_up_to_a_multiple(value in 0usize..1 << 40, shift in 0u32..12) {
        let alignment = 1usize << shift;
        let aligned = align_up(value, alignment).unwrap();
        prop_assert!(aligned >= value);
        prop_assert_eq!(aligned % alignment, 0);
        prop_assert!(aligned - value < alignment);
        prop_assert_eq!(align_up(aligned, alignment).unwrap(), aligned);
    }

    #[test]
    fn align_accepts_non_power_of_two(value in 0usize..1 << 32, alignment in 1usize..1000) {
        let aligned = align_up(value, alignment).unwrap();
        prop_assert!(aligned >= value);
        prop_assert_eq!(aligned % alignment, 0);
    }

    #[test]
    fn reservation_adds_exactly_one_slot(n in 0u32..1_000_000) {
        let on = ReservationRule { secondary_node: true };
        let off = ReservationRule::default();
        prop_assert_eq!(on.apply(n).unwrap(), if n == 0 { 0 } else { n as usize + 1 });
        prop_assert_eq!(off.apply(n).unwrap(), n as usize);
    }

    #[test]
    fn class_bytes_are_zero_then_non_decreasing(
        class in any_class(),
        profile in any_preset(),
        arena_size in 0usize..4096,
        n in 0u32..10_000,
        multiprocessing in any::<bool>(),
    ) {
        let geometry = HeapGeometry::for_profile(&profile).unwrap();
        let mut layouts = ClassLayouts::default();
        layouts.set(class, ClassLayout { arena_size: Some(arena_size), ..ClassLayout::default() });
        let model = SizeModel::new(geometry, &profile, &layouts, ReservationRule { secondary_node: multiprocessing });

        prop_assert_eq!(model.bytes(class, 0).unwrap(), 0);
        prop_assert!(model.bytes(class, n + 1).unwrap() >= model.bytes(class, n).unwrap());
    }

    #[test]
    fn workspace_never_shrinks_when_a_limit_grows(
        class in any_class(),
        profile in any_preset(),
        base in 0u32..64,
        extra in 1u32..64,
    ) {
        let config = |maximum: u32| Configuration::new(profile.clone())
            .with_capabilities(Capabilities { posix_api: true, multiprocessing: false })
            .with_maximum(class, maximum);
        let smaller = elaborate(&config(base)).unwrap();
        let larger = elaborate(&config(base + extra)).unwrap();
        prop_assert!(larger.workspace_size() >= smaller.workspace_size());
    }

    #[test]
    fn workspace_never_shrinks_when_a_stack_grows(
        tasks in 0u32..8,
        posix_threads in 0u32..8,
        stack in 0usize..16384,
        growth in 1usize..16384,
        init_task in prop::option::of(0usize..32768),
        init_thread in prop::option::of(0usize..32768),
        buffering in prop::option::of((0usize..8192, 0u32..4, 0usize..8192)),
        multiprocessing in any::<bool>(),
        floating_point in any::<bool>(),
        grown in 0usize..3,
    ) {
        let config = |minimum: usize, init_task: Option<usize>, init_thread: Option<usize>| {
            let config = Configuration::new(TargetProfile::preset("arm").unwrap())
                .with_capabilities(Capabilities { posix_api: true, multiprocessing })
                .with_maximum(ObjectClass::Tasks, tasks)
                .with_maximum(ObjectClass::PosixThreads, posix_threads)
                .with_stack(StackConfig {
                    minimum_task_stack_size: Some(minimum),
                    init_task_stack_size: init_task,
                    posix_init_thread_stack_size: init_thread,
                    floating_point,
                    ..StackConfig::default()
                });
            match buffering {
                Some((swapout_stack_size, workers, worker_stack_size)) => config
                    .with_block_buffering(BlockBuffering { swapout_stack_size, workers, worker_stack_size }),
                None => config,
            }
        };
        let grow = |size: Option<usize>| Some(size.unwrap_or(0) + growth);

        let smaller = elaborate(&config(stack, init_task, init_thread)).unwrap();
        let larger = match grown {
            0 => elaborate(&config(stack + growth, init_task, init_thread)),
            1 => elaborate(&config(stack, grow(init_task), init_thread)),
            _ => elaborate(&config(stack, init_task, grow(init_thread))),
        }
        .unwrap();
        prop_assert!(larger.workspace_size() >= smaller.workspace_size());
    }
}
