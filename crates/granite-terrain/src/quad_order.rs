use granite_core::glam::{UVec2, Vec2};

/// The four child quadrants of a node, as unit offsets.
pub type QuadOrder = [UVec2; 4];

const fn quad(a: (u32, u32), b: (u32, u32), c: (u32, u32), d: (u32, u32)) -> QuadOrder {
    [
        UVec2::new(a.0, a.1),
        UVec2::new(b.0, b.1),
        UVec2::new(c.0, c.1),
        UVec2::new(d.0, d.1),
    ]
}

/// Indexed by `(dir.x < 0) << 2 | (dir.y < 0) << 1 | (|dir.x| < |dir.y|)`.
const QUAD_ORDERS: [QuadOrder; 8] = [
    quad((0, 0), (0, 1), (1, 0), (1, 1)),
    quad((0, 0), (1, 0), (0, 1), (1, 1)),
    quad((0, 1), (0, 0), (1, 1), (1, 0)),
    quad((0, 1), (1, 1), (0, 0), (1, 0)),
    quad((1, 0), (1, 1), (0, 0), (0, 1)),
    quad((1, 0), (0, 0), (1, 1), (0, 1)),
    quad((1, 1), (1, 0), (0, 1), (0, 0)),
    quad((1, 1), (0, 1), (1, 0), (0, 0)),
];

/// Order in which to visit the children of a node, nearest to the camera first.
///
/// `dir` points from the camera to the node center. Ties on the dominant axis go to `x`.
pub fn quad_order(dir: Vec2) -> &'static QuadOrder {
    let mut index = 0;
    if dir.x < 0.0 {
        index |= 0b100;
    }
    if dir.y < 0.0 {
        index |= 0b010;
    }
    if dir.x.abs() < dir.y.abs() {
        index |= 0b001;
    }
    &QUAD_ORDERS[index]
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
