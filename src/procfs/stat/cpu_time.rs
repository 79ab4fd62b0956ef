use super::*;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CpuTime {
    /// time spent in user mode.
    user: UserHz,
    /// time spent in user mode with low priority (nice).
    nice: UserHz,
    /// time spent in system mode.
    system: UserHz,
    /// time spent in the idle task.
    ///
    /// this value should be USER_HZ times the second entry in the /proc/uptime pseudo-file.
    idle: UserHz,
    /// time waiting for i/o to complete.
    ///
    /// this value is not reliable, for the following reasons:
    ///   *  the cpu will not wait for i/o to complete; iowait is the time that a task is waiting
    ///      for i/o to complete. when a cpu goes into idle state for outstanding task i/o,
    ///      another task will be scheduled on this cpu.
    ///   *  on a multi-core cpu, the task waiting for i/o to complete is not running on any cpu,
    ///      so the iowait of each cpu is difficult to calculate.
    ///   *  the value in this field may decrease in certain conditions.
    iowait: UserHz,
    /// time servicing interrupts.
    irq: UserHz,
    /// time servicing softirqs.
    softirq: UserHz,
    /// stolen time, which is the time spent in other operating systems when running in a
    /// virtualized environment.
    steal: UserHz,
    /// time spent running a virtual cpu for guest operating systems under the control of the linux
    /// kernel.
    ///
    /// this is already accounted for in `user`.
    guest: UserHz,
    /// time spent running a niced guest (virtual cpu for guest operating systems under the
    /// control of the linux kernel).
    ///
    /// this is already accounted for in `nice`.
    guest_nice: UserHz,
}

// === impl CpuTime ===

impl CpuTime {
    /// the counter names of each field, in `/proc/stat` order.
    pub const NAMES: [&str; 10] = [
        "user",
        "nice",
        "system",
        "idle",
        "iowait",
        "irq",
        "softirq",
        "steal",
        "guest",
        "guest_nice",
    ];

    pub const TOTAL: &str = "total";
    pub const IDLE_ALL: &str = "idle_all";

    /// the fewest fields a cpu line may carry. older kernels omit the trailing fields.
    const REQUIRED: usize = 4;

    /// all time accounted for, excluding guest time that is already counted as user time.
    pub fn total(&self) -> UserHz {
        let Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest: _,
            guest_nice: _,
        } = *self;

        user + nice + system + idle + iowait + irq + softirq + steal
    }

    /// time spent idle, including time waiting for i/o.
    pub fn idle_all(&self) -> UserHz {
        let Self { idle, iowait, .. } = *self;
        idle + iowait
    }
}

impl TryFrom<Vec<UserHz>> for CpuTime {
    type Error = RecordError;
    fn try_from(mut times: Vec<UserHz>) -> Result<Self, Self::Error> {
        let (found, allowed) = (times.len(), Self::NAMES.len());
        if found < Self::REQUIRED {
            return Err(RecordError::Truncated {
                found,
                expected: Self::REQUIRED,
            });
        } else if found > allowed {
            return Err(RecordError::Overlong { found, allowed });
        }

        // pad any trailing fields this kernel does not report.
        times.resize(allowed, UserHz::ZERO);
        <_ as TryInto<[_; 10]>>::try_into(times)
            .map(Self::from)
            .map_err(|_| RecordError::Overlong { found, allowed })
    }
}

impl From<[UserHz; 10]> for CpuTime {
    fn from(
        [
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        ]: [UserHz; 10],
    ) -> Self {
        Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        }
    }
}

impl From<CpuTime> for [UserHz; 10] {
    fn from(
        CpuTime {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        }: CpuTime,
    ) -> Self {
        [
            user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice,
        ]
    }
}
