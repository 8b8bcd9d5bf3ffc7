// SPDX-License-Identifier: GPL-3.0-only

/// Generates a process-unique id allocator.
///
/// `$func_name()` hands out the lowest unused id after the last one issued,
/// ids are given back by removing them from `$ids_name` (usually in a `Drop` impl).
macro_rules! id_gen {
    ($func_name:ident, $id_name:ident, $ids_name:ident) => {
        static $id_name: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
        lazy_static::lazy_static! {
            static ref $ids_name: std::sync::Mutex<std::collections::HashSet<usize>> =
                std::sync::Mutex::new(std::collections::HashSet::new());
        }

        fn $func_name() -> usize {
            let mut ids = $ids_name
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if ids.len() == usize::MAX {
                panic!("Out of ids");
            }

            let id = loop {
                let new_id = $id_name.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if !ids.contains(&new_id) {
                    break new_id;
                }
            };

            ids.insert(id);
            id
        }
    };
}

pub(crate) use id_gen;
