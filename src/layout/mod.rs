mod card_solver;

pub use card_solver::{
    CardAnchor, CardLayout, CardLayoutConfig, CardOffset, LayoutNode, overlap_energy,
    solve_card_layout,
};
