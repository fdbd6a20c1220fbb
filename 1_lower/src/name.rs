use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering::Relaxed},
};

/// 名字的角色，决定前缀。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Input(usize),
    Output(usize),
    Constant,
    Intermediate(usize),
    /// 基本块，携带算子名
    Block(&'static str),
}

/// 名字分配器。每次分配原子地递增一次计数，可在多个线程间共享。
#[derive(Default, Debug)]
#[repr(transparent)]
pub struct Names(AtomicUsize);

impl Names {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn fresh(&self, role: Role) -> String {
        let id = self.0.fetch_add(1, Relaxed);
        format!("{}{id}", Prefix(role))
    }
}

struct Prefix(Role);

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Role::Input(i) => write!(f, "input{i}_"),
            Role::Output(i) => write!(f, "output{i}_"),
            Role::Constant => write!(f, "constant_"),
            Role::Intermediate(i) => write!(f, "intermediate{i}_"),
            Role::Block(op) => write!(f, "{op}_block_"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Names, Role};
    use std::{collections::HashSet, sync::Arc, thread};

    #[test]
    fn test_prefix() {
        let names = Names::new();
        assert_eq!(names.fresh(Role::Input(0)), "input0_0");
        assert_eq!(names.fresh(Role::Output(1)), "output1_1");
        assert_eq!(names.fresh(Role::Constant), "constant_2");
        assert_eq!(names.fresh(Role::Intermediate(3)), "intermediate3_3");
        assert_eq!(names.fresh(Role::Block("Op_ADD")), "Op_ADD_block_4");
    }

    #[test]
    fn test_unique() {
        const N: usize = 4;
        const M: usize = 256;

        let names = Arc::new(Names::new());
        let all = (0..N)
            .map(|_| {
                let names = names.clone();
                thread::spawn(move || {
                    (0..M)
                        .map(|i| names.fresh(Role::Intermediate(i % 2)))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect::<HashSet<_>>();
        assert_eq!(all.len(), N * M)
    }
}
