use super::{Found, Locate, LocateOutcome, LocateRequest, StrategyKind, Target};
use crate::platform::ScreenCapture;
use crate::util::{LocateError, LocateResult, Point};
use std::sync::Arc;

/// Resolves literal or screen-relative points.
///
/// Always succeeds with confidence 1.0 unless the point lies outside the
/// screen, which is an [`LocateError::OutOfBounds`] error.
pub struct CoordinateLocator {
    screen: Arc<dyn ScreenCapture>,
}

impl CoordinateLocator {
    pub fn new(screen: Arc<dyn ScreenCapture>) -> Self {
        Self { screen }
    }
}

impl Locate for CoordinateLocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Coordinate
    }

    fn locate(&self, request: &LocateRequest) -> LocateResult<LocateOutcome> {
        let bounds = self.screen.screen_bounds()?;
        let point = match request.require(self.kind())? {
            Target::Point(p) => *p,
            Target::Relative { x_ratio, y_ratio } => bounds.relative_point(*x_ratio, *y_ratio),
            other => {
                return Err(LocateError::InvalidRequest(format!(
                    "{other:?} is not a coordinate target"
                )))
            }
        };
        if !bounds.contains(point) {
            let Point { x, y } = point;
            return Err(LocateError::OutOfBounds { x, y });
        }
        Ok(LocateOutcome::Found(Found {
            center: point,
            confidence: 1.0,
            strategy: self.kind(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinateLocator;
    use crate::image::OwnedImage;
    use crate::locate::{Locate, LocateOutcome, LocateRequest, Target};
    use crate::platform::StaticScreen;
    use crate::util::{LocateError, Point};
    use std::sync::Arc;

    fn locator() -> CoordinateLocator {
        let screen = StaticScreen::new(OwnedImage::filled(200, 100, &[0, 0, 0]).unwrap());
        CoordinateLocator::new(Arc::new(screen))
    }

    #[test]
    fn literal_point_inside_screen() {
        let out = locator()
            .locate(&LocateRequest::new(Target::point(199, 0)))
            .unwrap();
        let LocateOutcome::Found(found) = out else {
            panic!("expected a point");
        };
        assert_eq!(found.center, Point::new(199, 0));
        assert_eq!(found.confidence, 1.0);
    }

    #[test]
    fn relative_point_scales_with_screen() {
        let req = LocateRequest::new(Target::Relative {
            x_ratio: 0.5,
            y_ratio: 0.25,
        });
        let out = locator().locate(&req).unwrap();
        assert_eq!(out.found().map(|f| f.center), Some(Point::new(100, 25)));
    }

    #[test]
    fn point_outside_screen_is_out_of_bounds() {
        let err = locator()
            .locate(&LocateRequest::new(Target::point(200, 10)))
            .unwrap_err();
        assert_eq!(err, LocateError::OutOfBounds { x: 200, y: 10 });
        assert!(!err.is_recoverable());
    }
}
