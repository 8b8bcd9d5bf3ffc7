// SPDX-License-Identifier: GPL-3.0-only

mod ids;
pub(crate) use self::ids::id_gen;
