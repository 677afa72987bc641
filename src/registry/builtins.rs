use crate::program;
use crate::workload;

use super::Registries;

pub(super) fn register_builtins(registries: &mut Registries) {
    registries.register_workload("contract", workload::contract);
    registries.register_workload("transfer", workload::transfer);

    registries.register_program("counter", program::counter);
    registries.register_program("short_content", program::short_content);
    registries.register_program("native_counter", program::native_counter);
}
